mod keyword;

pub use keyword::KeywordRecognizer;

use crate::error::{config_error, BotResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Top intent returned by a recognizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    pub intent: String,
    pub score: f32,
}

impl Recognition {
    /// Recognition result for an utterance nothing matched
    pub fn none() -> Self {
        Self {
            intent: "None".to_string(),
            score: 0.0,
        }
    }
}

/// Intent model family a recognizer is trained for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    Calendar,
    General,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::Calendar, Domain::General];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Calendar => "calendar",
            Domain::General => "general",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Domain::ALL.into_iter().find(|d| d.as_str() == name)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Natural-language intent classifier
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, utterance: &str) -> BotResult<Recognition>;
}

/// Recognizers configured per domain
#[derive(Clone, Default)]
pub struct RecognizerRegistry {
    recognizers: HashMap<Domain, Arc<dyn Recognizer>>,
}

impl RecognizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recognizer for a domain
    pub fn with(mut self, domain: Domain, recognizer: Arc<dyn Recognizer>) -> Self {
        self.recognizers.insert(domain, recognizer);
        self
    }

    /// Build keyword recognizers from a TOML phrase table
    pub fn from_toml_str(content: &str) -> BotResult<Self> {
        let tables: HashMap<String, BTreeMap<String, Vec<String>>> = toml::from_str(content)?;
        let mut registry = Self::new();

        for (name, phrases) in tables {
            match Domain::from_name(&name) {
                Some(domain) => {
                    info!("Loaded {} intents for domain {}", phrases.len(), domain);
                    registry = registry.with(domain, Arc::new(KeywordRecognizer::new(phrases)));
                }
                None => warn!("Ignoring phrase table for unknown domain '{}'", name),
            }
        }

        Ok(registry)
    }

    /// Load keyword recognizers from a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> BotResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            config_error(&format!(
                "Could not read intent configuration {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Recognizer for a domain; a missing one is a configuration error
    pub fn get(&self, domain: Domain) -> BotResult<&Arc<dyn Recognizer>> {
        self.recognizers.get(&domain).ok_or_else(|| {
            config_error(&format!(
                "The intent model for domain '{}' could not be found in the skill configuration",
                domain
            ))
        })
    }

    /// Fail unless every listed domain has a recognizer
    pub fn validate(&self, required: &[Domain]) -> BotResult<()> {
        for domain in required {
            self.get(*domain)?;
        }
        Ok(())
    }

    pub async fn recognize(&self, domain: Domain, utterance: &str) -> BotResult<Recognition> {
        self.get(domain)?.recognize(utterance).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_from_toml() {
        let registry = RecognizerRegistry::from_toml_str(
            r#"
            [calendar]
            NextMeeting = ["next meeting"]

            [general]
            Cancel = ["cancel"]

            [weather]
            Forecast = ["forecast"]
            "#,
        )
        .unwrap();

        assert!(registry.validate(&Domain::ALL).is_ok());
        let result = registry
            .recognize(Domain::Calendar, "what's my next meeting?")
            .await
            .unwrap();
        assert_eq!(result.intent, "NextMeeting");
    }

    #[tokio::test]
    async fn test_missing_domain_is_config_error() {
        let registry = RecognizerRegistry::from_toml_str("[calendar]\nSummary = [\"summary\"]\n").unwrap();

        let err = registry.recognize(Domain::General, "cancel").await.unwrap_err();
        assert!(err.is_fatal());
        assert!(registry.validate(&Domain::ALL).is_err());
    }
}
