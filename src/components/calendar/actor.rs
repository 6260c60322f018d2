use super::models::{CalendarEvent, NewEvent};
use super::{google, microsoft, EventSource, MAX_UPCOMING_EVENTS, UPCOMING_HORIZON_DAYS};
use crate::error::{calendar_error, BotResult};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The calendar actor that processes provider requests
pub struct CalendarActor {
    client: Client,
    command_rx: mpsc::Receiver<CalendarCommand>,
}

/// Commands that can be sent to the calendar actor
pub enum CalendarCommand {
    ListRange {
        token: String,
        source: EventSource,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        respond: mpsc::Sender<BotResult<Vec<CalendarEvent>>>,
    },
    ListUpcoming {
        token: String,
        source: EventSource,
        respond: mpsc::Sender<BotResult<Vec<CalendarEvent>>>,
    },
    Create {
        token: String,
        source: EventSource,
        event: NewEvent,
        respond: mpsc::Sender<BotResult<CalendarEvent>>,
    },
    Delete {
        token: String,
        source: EventSource,
        event_id: String,
        respond: mpsc::Sender<BotResult<()>>,
    },
    UpdateStart {
        token: String,
        source: EventSource,
        event: CalendarEvent,
        start: DateTime<Utc>,
        respond: mpsc::Sender<BotResult<CalendarEvent>>,
    },
    Shutdown,
}

/// Handle for communicating with the calendar actor
#[derive(Clone)]
pub struct CalendarActorHandle {
    command_tx: mpsc::Sender<CalendarCommand>,
}

impl CalendarActorHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(mpsc::Sender<BotResult<T>>) -> CalendarCommand,
    ) -> BotResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(command(response_tx))
            .await
            .map_err(|e| calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| calendar_error("Response channel closed"))?
    }

    /// List events in a UTC window
    pub async fn list_range(
        &self,
        token: &str,
        source: EventSource,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BotResult<Vec<CalendarEvent>> {
        let token = token.to_string();
        self.request(|respond| CalendarCommand::ListRange {
            token,
            source,
            start,
            end,
            respond,
        })
        .await
    }

    /// List upcoming events
    pub async fn list_upcoming(&self, token: &str, source: EventSource) -> BotResult<Vec<CalendarEvent>> {
        let token = token.to_string();
        self.request(|respond| CalendarCommand::ListUpcoming {
            token,
            source,
            respond,
        })
        .await
    }

    /// Create an event
    pub async fn create(&self, token: &str, source: EventSource, event: NewEvent) -> BotResult<CalendarEvent> {
        let token = token.to_string();
        self.request(|respond| CalendarCommand::Create {
            token,
            source,
            event,
            respond,
        })
        .await
    }

    /// Delete an event
    pub async fn delete(&self, token: &str, source: EventSource, event_id: &str) -> BotResult<()> {
        let token = token.to_string();
        let event_id = event_id.to_string();
        self.request(|respond| CalendarCommand::Delete {
            token,
            source,
            event_id,
            respond,
        })
        .await
    }

    /// Move an event to a new start
    pub async fn update_start(
        &self,
        token: &str,
        source: EventSource,
        event: CalendarEvent,
        start: DateTime<Utc>,
    ) -> BotResult<CalendarEvent> {
        let token = token.to_string();
        self.request(|respond| CalendarCommand::UpdateStart {
            token,
            source,
            event,
            start,
            respond,
        })
        .await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        let _ = self.command_tx.send(CalendarCommand::Shutdown).await;
        Ok(())
    }
}

impl CalendarActor {
    /// Create a new actor and return its handle
    pub fn new() -> (Self, CalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            client: Client::new(),
            command_rx,
        };

        let handle = CalendarActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Calendar actor started");

        // one task per request
        while let Some(cmd) = self.command_rx.recv().await {
            let client = self.client.clone();
            match cmd {
                CalendarCommand::ListRange {
                    token,
                    source,
                    start,
                    end,
                    respond,
                } => {
                    tokio::spawn(async move {
                        debug!("Listing {} events between {} and {}", source, start, end);
                        let result = list_events(&client, &token, source, start, end, None).await;
                        reply(respond, result).await;
                    });
                }
                CalendarCommand::ListUpcoming {
                    token,
                    source,
                    respond,
                } => {
                    tokio::spawn(async move {
                        let now = Utc::now();
                        let horizon = now + Duration::days(UPCOMING_HORIZON_DAYS);
                        debug!("Listing upcoming {} events", source);
                        let result =
                            list_events(&client, &token, source, now, horizon, Some(MAX_UPCOMING_EVENTS))
                                .await
                                .map(|events| {
                                    // calendar views include events already in progress
                                    events.into_iter().filter(|e| e.start >= now).collect()
                                });
                        reply(respond, result).await;
                    });
                }
                CalendarCommand::Create {
                    token,
                    source,
                    event,
                    respond,
                } => {
                    tokio::spawn(async move {
                        let result = match source {
                            EventSource::Google => google::create_event(&client, &token, &event).await,
                            EventSource::Microsoft => {
                                microsoft::create_event(&client, &token, &event).await
                            }
                        };
                        reply(respond, result).await;
                    });
                }
                CalendarCommand::Delete {
                    token,
                    source,
                    event_id,
                    respond,
                } => {
                    tokio::spawn(async move {
                        let result = match source {
                            EventSource::Google => google::delete_event(&client, &token, &event_id).await,
                            EventSource::Microsoft => {
                                microsoft::delete_event(&client, &token, &event_id).await
                            }
                        };
                        reply(respond, result).await;
                    });
                }
                CalendarCommand::UpdateStart {
                    token,
                    source,
                    event,
                    start,
                    respond,
                } => {
                    tokio::spawn(async move {
                        let end = start + Duration::minutes(event.duration_minutes());
                        let result = match source {
                            EventSource::Google => {
                                google::patch_event_times(&client, &token, &event, start, end).await
                            }
                            EventSource::Microsoft => {
                                microsoft::patch_event_times(&client, &token, &event, start, end).await
                            }
                        };
                        reply(respond, result).await;
                    });
                }
                CalendarCommand::Shutdown => {
                    info!("Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Calendar actor shut down");
    }
}

async fn list_events(
    client: &Client,
    token: &str,
    source: EventSource,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    max_results: Option<usize>,
) -> BotResult<Vec<CalendarEvent>> {
    match source {
        EventSource::Google => google::list_events(client, token, start, end, max_results).await,
        EventSource::Microsoft => microsoft::list_events(client, token, start, end, max_results).await,
    }
}

async fn reply<T>(respond: mpsc::Sender<BotResult<T>>, result: BotResult<T>) {
    if let Err(e) = &result {
        warn!("Calendar request failed: {}", e);
    }
    let _ = respond.send(result).await;
}
