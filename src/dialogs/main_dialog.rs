use super::activity::{Activity, Turn, TurnKind};
use super::engine::{DialogEngine, DialogTurnStatus};
use super::intents::{CalendarIntent, GeneralIntent};
use super::services::Services;
use super::state::{ConversationState, DialogId, DialogOptions, StepValue};
use crate::error::BotResult;
use rust_i18n::t;
use tracing::{debug, info, warn};

/// What the interruption check did with the turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionAction {
    /// The stack was replaced; routing stops
    StartedDialog,
    /// A reply was sent and the active sub-flow stays as it was
    MessageSentToUser,
    NoAction,
}

/// Where a top-level calendar intent leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Begin(DialogId),
    Confused,
    NotAvailable,
}

/// Dispatch table for top-level intents
pub fn route_for(intent: CalendarIntent) -> Route {
    match intent {
        CalendarIntent::FindMeetingRoom | CalendarIntent::CreateCalendarEntry => {
            Route::Begin(DialogId::CreateEvent)
        }
        CalendarIntent::DeleteCalendarEntry => Route::Begin(DialogId::DeleteEvent),
        CalendarIntent::NextMeeting => Route::Begin(DialogId::NextMeeting),
        CalendarIntent::ChangeCalendarEntry => Route::Begin(DialogId::UpdateEvent),
        CalendarIntent::FindCalendarEntry
        | CalendarIntent::ShowNext
        | CalendarIntent::ShowPrevious
        | CalendarIntent::Summary => Route::Begin(DialogId::Summary),
        CalendarIntent::None => Route::Confused,
        CalendarIntent::CheckAvailability
        | CalendarIntent::ConfirmNo
        | CalendarIntent::ConfirmYes
        | CalendarIntent::FindCalendarWhen
        | CalendarIntent::FindCalendarWhere
        | CalendarIntent::FindCalendarWho
        | CalendarIntent::FindDuration
        | CalendarIntent::GoBack
        | CalendarIntent::ReadAloud
        | CalendarIntent::Reject
        | CalendarIntent::TimeRemaining => Route::NotAvailable,
    }
}

/// Entry point of the skill: interruptions, routing and completion
pub struct MainDialog {
    engine: DialogEngine,
    services: Services,
    options: DialogOptions,
}

impl MainDialog {
    pub fn new(services: Services, skill_mode: bool) -> Self {
        Self {
            engine: super::engine_with_dialogs(),
            services,
            options: DialogOptions { skill_mode },
        }
    }

    /// Process one turn against the conversation's state, returning the replies
    pub async fn on_turn(&self, state: &mut ConversationState, turn: &Turn) -> BotResult<Vec<Activity>> {
        let mut outbox = Vec::new();

        match &turn.kind {
            TurnKind::ConversationStart => {
                if !self.options.skill_mode {
                    outbox.push(Activity::Message(t!("intro").to_string()));
                }
            }
            TurnKind::TokenResponse(token) => {
                let status = self
                    .engine
                    .continue_active(
                        StepValue::Token(token.clone()),
                        state,
                        &self.services,
                        turn,
                        self.options,
                        &mut outbox,
                    )
                    .await?;
                if status != DialogTurnStatus::Waiting && self.options.skill_mode {
                    outbox.push(Activity::EndOfConversation);
                }
            }
            TurnKind::Message(text) => self.on_message(state, turn, text, &mut outbox).await?,
        }

        Ok(outbox)
    }

    async fn on_message(
        &self,
        state: &mut ConversationState,
        turn: &Turn,
        text: &str,
        outbox: &mut Vec<Activity>,
    ) -> BotResult<()> {
        match self.on_interrupt(state, turn, outbox).await? {
            InterruptionAction::StartedDialog => {
                if state.stack.is_empty() && self.options.skill_mode {
                    outbox.push(Activity::EndOfConversation);
                }
                return Ok(());
            }
            InterruptionAction::MessageSentToUser => return Ok(()),
            InterruptionAction::NoAction => {}
        }

        let status = if state.stack.is_empty() {
            self.route(state, turn, outbox).await?
        } else {
            self.engine
                .continue_active(
                    StepValue::Text(text.to_string()),
                    state,
                    &self.services,
                    turn,
                    self.options,
                    outbox,
                )
                .await?
        };

        match status {
            DialogTurnStatus::Complete(_) => self.complete(outbox),
            DialogTurnStatus::Cancelled if self.options.skill_mode => {
                outbox.push(Activity::EndOfConversation)
            }
            DialogTurnStatus::Cancelled | DialogTurnStatus::Waiting | DialogTurnStatus::Empty => {}
        }
        Ok(())
    }

    /// Global intents can preempt whatever is in progress
    async fn on_interrupt(
        &self,
        state: &mut ConversationState,
        turn: &Turn,
        outbox: &mut Vec<Activity>,
    ) -> BotResult<InterruptionAction> {
        let intent = self.services.general_intent(turn.text()).await?;

        match intent {
            GeneralIntent::Cancel => {
                self.engine
                    .begin(
                        DialogId::Cancel,
                        StepValue::None,
                        state,
                        &self.services,
                        turn,
                        self.options,
                        outbox,
                    )
                    .await?;
                Ok(InterruptionAction::StartedDialog)
            }
            GeneralIntent::Help => {
                outbox.push(Activity::Message(t!("help").to_string()));
                Ok(InterruptionAction::MessageSentToUser)
            }
            GeneralIntent::Logout => {
                state.stack.clear();
                match self
                    .services
                    .auth
                    .sign_out(&turn.user_id, &self.services.connection_name)
                    .await
                {
                    Ok(()) => {
                        info!("User {} signed out", turn.user_id);
                        outbox.push(Activity::Message(t!("signed_out").to_string()));
                    }
                    Err(e) => {
                        warn!("Sign-out failed for user {}: {:?}", turn.user_id, e);
                        outbox.push(Activity::Message(t!("sign_out_failed").to_string()));
                    }
                }
                state.session.clear();
                Ok(InterruptionAction::StartedDialog)
            }
            GeneralIntent::None => Ok(InterruptionAction::NoAction),
        }
    }

    /// Start the sub-flow for a top-level utterance
    async fn route(
        &self,
        state: &mut ConversationState,
        turn: &Turn,
        outbox: &mut Vec<Activity>,
    ) -> BotResult<DialogTurnStatus> {
        let intent = self.services.calendar_intent(turn.text()).await?;
        let route = route_for(intent);
        debug!("Routing {:?} to {:?}", intent, route);

        let reply = match route {
            Route::Begin(dialog) => {
                return self
                    .engine
                    .begin(
                        dialog,
                        StepValue::Options(self.options),
                        state,
                        &self.services,
                        turn,
                        self.options,
                        outbox,
                    )
                    .await;
            }
            Route::Confused => t!("confused"),
            Route::NotAvailable => t!("not_available"),
        };

        outbox.push(Activity::Message(reply.to_string()));
        if self.options.skill_mode {
            Ok(DialogTurnStatus::Complete(StepValue::None))
        } else {
            Ok(DialogTurnStatus::Empty)
        }
    }

    fn complete(&self, outbox: &mut Vec<Activity>) {
        if self.options.skill_mode {
            outbox.push(Activity::EndOfConversation);
        } else {
            outbox.push(Activity::Message(t!("completed").to_string()));
        }
    }
}
