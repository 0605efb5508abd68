use crate::config::EngineConfig;
use crate::kernel::dialogue::{ClarifyReason, Effect};

/// PURE FUNCTION: turns a non-dispatch effect into the reply text.
pub fn realize(effect: &Effect, config: &EngineConfig) -> String {
    match effect {
        Effect::Clarify(ClarifyReason::EmptyInput) => {
            "I didn't catch that. Could you please repeat?".to_string()
        }
        Effect::Clarify(_) => "I'm not sure what you mean. Can you rephrase?".to_string(),
        Effect::Unavailable => {
            "I don't have any commands available right now. Check the tool manifest.".to_string()
        }
        Effect::Prompt { missing, opened } => {
            let missing = missing.join(", ");
            let hint = config.completion_hint();
            match (*opened, hint.is_empty()) {
                (true, false) => format!(
                    "I need more information. Required: {}. Say {} if that's everything.",
                    missing, hint
                ),
                (true, true) => format!("I need more information. Required: {}.", missing),
                (false, false) => format!("Do you have info for {}? If not, say {}.", missing, hint),
                (false, true) => format!("Do you have info for {}?", missing),
            }
        }
        Effect::Abandoned { command } => {
            format!("Okay, I've cancelled {}.", command.replace('_', " "))
        }
        Effect::Dispatch(_) => String::new(), // Dispatch replies come from the handler
    }
}
