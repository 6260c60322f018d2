use super::intents::{CalendarIntent, GeneralIntent};
use crate::components::auth::Authenticator;
use crate::components::calendar::CalendarService;
use crate::components::recognizer::{Domain, RecognizerRegistry};
use crate::error::BotResult;
use std::sync::Arc;
use tracing::debug;

/// Collaborators shared by every conversation
#[derive(Clone)]
pub struct Services {
    pub recognizers: RecognizerRegistry,
    pub calendar: Arc<dyn CalendarService>,
    pub auth: Arc<dyn Authenticator>,
    /// Name of the OAuth connection signed out of on logout
    pub connection_name: String,
}

impl Services {
    pub fn new(
        recognizers: RecognizerRegistry,
        calendar: Arc<dyn CalendarService>,
        auth: Arc<dyn Authenticator>,
        connection_name: impl Into<String>,
    ) -> Self {
        Self {
            recognizers,
            calendar,
            auth,
            connection_name: connection_name.into(),
        }
    }

    pub async fn calendar_intent(&self, utterance: &str) -> BotResult<CalendarIntent> {
        let recognition = self
            .recognizers
            .recognize(Domain::Calendar, utterance)
            .await?;
        let intent = CalendarIntent::from(&recognition);
        debug!("Calendar intent {:?} ({:.2})", intent, recognition.score);
        Ok(intent)
    }

    pub async fn general_intent(&self, utterance: &str) -> BotResult<GeneralIntent> {
        let recognition = self
            .recognizers
            .recognize(Domain::General, utterance)
            .await?;
        let intent = GeneralIntent::from(&recognition);
        debug!("General intent {:?} ({:.2})", intent, recognition.score);
        Ok(intent)
    }
}
