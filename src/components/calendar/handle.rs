use super::actor::{CalendarActor, CalendarActorHandle};
use super::models::{CalendarEvent, NewEvent};
use super::{CalendarService, EventSource};
use crate::error::BotResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for interacting with the calendar actor
#[derive(Clone)]
pub struct CalendarHandle {
    actor_handle: CalendarActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl CalendarHandle {
    /// Create a new CalendarHandle and spawn the actor
    pub fn new() -> Self {
        // Create the actor and get its handle
        let (mut actor, handle) = CalendarActor::new();

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        self.actor_handle.shutdown().await
    }
}

#[async_trait]
impl CalendarService for CalendarHandle {
    async fn list_events_in_range(
        &self,
        token: &str,
        source: EventSource,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BotResult<Vec<CalendarEvent>> {
        self.actor_handle.list_range(token, source, start, end).await
    }

    async fn list_upcoming(&self, token: &str, source: EventSource) -> BotResult<Vec<CalendarEvent>> {
        self.actor_handle.list_upcoming(token, source).await
    }

    async fn create_event(
        &self,
        token: &str,
        source: EventSource,
        event: &NewEvent,
    ) -> BotResult<CalendarEvent> {
        self.actor_handle.create(token, source, event.clone()).await
    }

    async fn delete_event(&self, token: &str, source: EventSource, event_id: &str) -> BotResult<()> {
        self.actor_handle.delete(token, source, event_id).await
    }

    async fn update_event_start(
        &self,
        token: &str,
        source: EventSource,
        event: &CalendarEvent,
        start: DateTime<Utc>,
    ) -> BotResult<CalendarEvent> {
        self.actor_handle
            .update_start(token, source, event.clone(), start)
            .await
    }
}
