//! Dialog orchestration: session state, the waterfall engine, the sub-flows
//! and the router that picks between them.

pub mod activity;
pub mod engine;
pub mod intents;
pub mod listing;
pub mod main_dialog;
pub mod services;
pub mod state;

mod cancel;
mod create_event;
mod delete_event;
mod next_meeting;
mod shared;
mod summary;
mod update_event;

pub use activity::{Activity, Turn, TurnKind};
pub use engine::{DialogEngine, DialogTurnStatus, StepContext, StepOutcome, Waterfall};
pub use intents::{CalendarIntent, GeneralIntent};
pub use main_dialog::MainDialog;
pub use services::Services;
pub use state::{ConversationState, DialogId, DialogOptions, SessionState, StepValue, PAGE_SIZE};

use std::sync::Arc;

/// Engine with every calendar sub-flow registered
pub fn engine_with_dialogs() -> DialogEngine {
    let mut engine = DialogEngine::new();
    engine.register(Arc::new(summary::SummaryDialog));
    engine.register(Arc::new(summary::ReadEventDialog));
    engine.register(Arc::new(next_meeting::NextMeetingDialog));
    engine.register(Arc::new(create_event::CreateEventDialog));
    engine.register(Arc::new(delete_event::DeleteEventDialog));
    engine.register(Arc::new(update_event::UpdateEventDialog));
    engine.register(Arc::new(cancel::CancelDialog));
    engine
}
