use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for the dialogue engine. Every field has a default, so a config
/// file only needs the keys it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum cosine similarity for a phrase match to count as a command.
    pub match_threshold: f64,
    /// Replies that close an open session and dispatch with what is known.
    pub completion_phrases: Vec<String>,
    /// Replies that close an open session without dispatching.
    pub abandon_phrases: Vec<String>,
    /// Per-command handler timeout. `null` disables it.
    pub handler_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.65,
            completion_phrases: vec![
                "that's all".to_string(),
                "thats all".to_string(),
                "done".to_string(),
            ],
            abandon_phrases: vec![
                "cancel".to_string(),
                "never mind".to_string(),
                "nevermind".to_string(),
                "forget it".to_string(),
            ],
            handler_timeout_ms: Some(30_000),
        }
    }
}

impl EngineConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(ConfigError::InvalidThreshold(self.match_threshold));
        }
        Ok(())
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout_ms.map(Duration::from_millis)
    }

    pub fn is_completion(&self, text: &str) -> bool {
        matches_phrase(&self.completion_phrases, text)
    }

    pub fn is_abandon(&self, text: &str) -> bool {
        matches_phrase(&self.abandon_phrases, text)
    }

    /// Every completion phrase, quoted: `"that's all", "thats all" or "done"`.
    /// Empty when no phrase is configured.
    pub fn completion_hint(&self) -> String {
        let quoted: Vec<String> = self
            .completion_phrases
            .iter()
            .map(|p| format!("\"{}\"", p))
            .collect();
        match quoted.split_last() {
            None => String::new(),
            Some((last, [])) => last.clone(),
            Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
        }
    }
}

fn matches_phrase(phrases: &[String], text: &str) -> bool {
    let reply = normalize_reply(text);
    !reply.is_empty() && phrases.iter().any(|p| normalize_reply(p) == reply)
}

/// Lowercase, unify curly apostrophes, drop trailing sentence punctuation.
fn normalize_reply(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .replace('\u{2019}', "'")
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?'))
        .trim()
        .to_string()
}
