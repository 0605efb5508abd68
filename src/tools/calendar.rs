//! In-memory calendar. Meetings live as long as the process.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::registry::{sync_handler, Handler, ParamMap, ToolModule};

static TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}(?::\d{2})?\s*(?:am|pm)|\d{1,2}:\d{2}|noon|midnight)\b")
        .expect("static pattern")
});
// "schedule a meeting called ..." and friends.
static LEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:please\s+)?(?:schedule|book|set up|add|create)\s+(?:a\s+|an\s+)?(?:meeting|event)\b\s*(?:called|titled|named|about|for)?\s*",
    )
    .expect("static pattern")
});
static TRAILING_CONNECTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\b(?:at|on|for)\s*$").expect("static pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub title: String,
    pub time: String,
}

#[derive(Debug, Clone, Default)]
pub struct Calendar {
    meetings: Arc<Mutex<Vec<Meeting>>>,
}

impl Calendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meetings(&self) -> Vec<Meeting> {
        self.meetings
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl ToolModule for Calendar {
    fn spec(&self) -> Option<Value> {
        Some(json!({
            "intent": "calendar",
            "description": "Schedule and list meetings.",
            "commands": {
                "schedule_meeting": {
                    "examples": [
                        "schedule a meeting", "book a meeting", "set up a meeting",
                        "add a meeting to my calendar", "create an event"
                    ],
                    "params": ["title", "time"],
                    "function": "schedule_meeting"
                },
                "list_meetings": {
                    "examples": [
                        "what's on my calendar", "show my calendar", "list my meetings",
                        "what meetings do i have"
                    ],
                    "params": [],
                    "function": "list_meetings"
                }
            }
        }))
    }

    fn handler(&self, function: &str) -> Option<Handler> {
        let meetings = Arc::clone(&self.meetings);
        match function {
            "schedule_meeting" => Some(sync_handler(move |params| schedule(&meetings, &params))),
            "list_meetings" => Some(sync_handler(move |_| list(&meetings))),
            _ => None,
        }
    }

    /// Splits "Standup at 9am" into a title and a time.
    fn resolve_params(&self, text: &str) -> Result<ParamMap> {
        let mut out = ParamMap::new();

        let remainder = match TIME.find(text) {
            Some(m) => {
                out.insert("time".into(), json!(m.as_str().trim()));
                format!("{} {}", &text[..m.start()], &text[m.end()..])
            }
            None => text.to_string(),
        };

        let title = LEAD.replace(remainder.trim(), "");
        let title = TRAILING_CONNECTOR.replace(title.trim(), "");
        let title = title.trim().trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());
        if !title.is_empty() {
            out.insert("title".into(), json!(title));
        }

        Ok(out)
    }
}

fn schedule(meetings: &Mutex<Vec<Meeting>>, params: &ParamMap) -> Result<String> {
    // Absent parameters get placeholders here, not in the engine.
    let title = params
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("Untitled meeting")
        .to_string();
    let time = params.get("time").and_then(Value::as_str).map(str::to_string);

    let reply = match &time {
        Some(time) => format!("Scheduled '{}' at {}.", title, time),
        None => format!("Scheduled '{}' with no time set.", title),
    };

    meetings
        .lock()
        .map_err(|_| anyhow!("calendar store poisoned"))?
        .push(Meeting {
            title,
            time: time.unwrap_or_else(|| "unspecified time".to_string()),
        });
    Ok(reply)
}

fn list(meetings: &Mutex<Vec<Meeting>>) -> Result<String> {
    let meetings = meetings
        .lock()
        .map_err(|_| anyhow!("calendar store poisoned"))?;

    if meetings.is_empty() {
        return Ok("You have no meetings scheduled.".to_string());
    }
    let entries = meetings
        .iter()
        .map(|m| format!("{} at {}", m.title, m.time))
        .collect::<Vec<_>>()
        .join("; ");
    Ok(format!("You have {} meeting(s): {}.", meetings.len(), entries))
}
