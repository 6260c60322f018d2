use super::{Recognition, Recognizer};
use crate::error::BotResult;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Phrase-matching recognizer: the intent whose phrase covers most of the utterance wins
#[derive(Debug, Clone, Default)]
pub struct KeywordRecognizer {
    /// intent name -> normalized phrases
    phrases: BTreeMap<String, Vec<String>>,
}

impl KeywordRecognizer {
    pub fn new(phrases: BTreeMap<String, Vec<String>>) -> Self {
        let phrases = phrases
            .into_iter()
            .map(|(intent, list)| {
                let list = list
                    .iter()
                    .map(|p| normalize(p))
                    .filter(|p| !p.is_empty())
                    .collect();
                (intent, list)
            })
            .collect();
        Self { phrases }
    }

    /// Best matching intent, or "None"
    pub fn classify(&self, utterance: &str) -> Recognition {
        let text = normalize(utterance);
        if text.is_empty() {
            return Recognition::none();
        }

        let padded = format!(" {} ", text);
        let total_words = text.split(' ').count() as f32;
        let mut best: Option<(f32, usize, &str)> = None;

        for (intent, phrases) in &self.phrases {
            for phrase in phrases {
                if !padded.contains(&format!(" {} ", phrase)) {
                    continue;
                }
                let words = phrase.split(' ').count();
                let score = (words as f32 / total_words).min(1.0);
                let better = match best {
                    None => true,
                    Some((best_score, best_len, _)) => {
                        score > best_score || (score == best_score && phrase.len() > best_len)
                    }
                };
                if better {
                    best = Some((score, phrase.len(), intent.as_str()));
                }
            }
        }

        match best {
            Some((score, _, intent)) => Recognition {
                intent: intent.to_string(),
                score,
            },
            None => Recognition::none(),
        }
    }
}

#[async_trait]
impl Recognizer for KeywordRecognizer {
    async fn recognize(&self, utterance: &str) -> BotResult<Recognition> {
        Ok(self.classify(utterance))
    }
}

/// Lowercase, drop punctuation, collapse whitespace
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer() -> KeywordRecognizer {
        let mut phrases = BTreeMap::new();
        phrases.insert("Summary".to_string(), vec!["what's on my calendar".to_string()]);
        phrases.insert("ShowNext".to_string(), vec!["next".to_string(), "show more".to_string()]);
        phrases.insert("NextMeeting".to_string(), vec!["next meeting".to_string()]);
        KeywordRecognizer::new(phrases)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  What's   ON my Calendar?! "), "what's on my calendar");
    }

    #[test]
    fn test_longest_covering_phrase_wins() {
        let r = recognizer();
        assert_eq!(r.classify("What's on my calendar today?").intent, "Summary");
        assert_eq!(r.classify("when is my next meeting").intent, "NextMeeting");
        assert_eq!(r.classify("next").intent, "ShowNext");
        assert_eq!(r.classify("next").score, 1.0);
    }

    #[test]
    fn test_phrases_match_whole_words() {
        let r = recognizer();
        assert_eq!(r.classify("nextdoor").intent, "None");
        assert_eq!(r.classify("").intent, "None");
    }
}
