use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::registry::{Candidates, ParamMap};

/// Keyword entity extraction over a candidate parameter set.
///
/// Closed-value parameters only ever receive one of their declared values;
/// open-ended parameters receive the whole trimmed input. Stateless, so the
/// same text and candidates always give the same result.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityExtractor;

impl EntityExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str, candidates: &Candidates) -> ParamMap {
        let mut entities = ParamMap::new();
        let trimmed = text.trim();

        for (param, values) in candidates {
            if values.is_empty() {
                if !trimmed.is_empty() {
                    entities.insert(param.clone(), Value::String(trimmed.to_string()));
                }
                continue;
            }

            // First declared value wins.
            if let Some(value) = values.iter().find(|v| contains_word(text, v)) {
                entities.insert(param.clone(), Value::String(value.clone()));
            }
        }

        entities
    }
}

/// Case-insensitive whole-word search for a literal value.
fn contains_word(text: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        return false;
    }
    let pattern = format!(r"(?i)\b{}\b", regex::escape(value));
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            warn!(value, "Candidate pattern rejected: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(pairs: &[(&str, &[&str])]) -> Candidates {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn closed_value_needs_whole_word() {
        let c = candidates(&[("state", &["on", "off"])]);
        assert!(EntityExtractor::new().extract("turn it online", &c).is_empty());
        assert_eq!(
            EntityExtractor::new().extract("switch it ON", &c)["state"],
            Value::String("on".into())
        );
    }

    #[test]
    fn blank_values_never_match() {
        let c = candidates(&[("mode", &["", "  "])]);
        assert!(EntityExtractor::new().extract("anything", &c).is_empty());
    }

    #[test]
    fn open_ended_skips_blank_input() {
        let c = candidates(&[("title", &[])]);
        assert!(EntityExtractor::new().extract("   ", &c).is_empty());
    }
}
