use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kernel::time::Turn;
use crate::registry::ParamMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A partially-parameterized command waiting for the user to fill it.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueSession {
    pub id: SessionId,
    pub intent: String,
    pub command: String,
    /// Everything resolved so far. Absent parameters have no key.
    pub params: ParamMap,
    /// Declared parameters still without a value, in declaration order.
    pub missing: Vec<String>,
    pub opened_at: Turn,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DialogueState {
    #[default]
    Idle,
    /// While open, every input is read as an answer, never as a new command.
    AwaitingParams(DialogueSession),
}

impl DialogueState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DialogueState::Idle)
    }

    pub fn session(&self) -> Option<&DialogueSession> {
        match self {
            DialogueState::Idle => None,
            DialogueState::AwaitingParams(session) => Some(session),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClarifyReason {
    EmptyInput,
    NoMatch,
    LowConfidence,
}

/// How a dispatch came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Completion {
    /// Matched with nothing missing; no session was opened.
    Immediate,
    /// The last missing parameter was supplied.
    Filled,
    /// The user declared completion with parameters still missing.
    Early,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub intent: String,
    pub command: String,
    pub params: ParamMap,
    pub completion: Completion,
}

/// What the engine must do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Clarify(ClarifyReason),
    /// The registry has no commands at all.
    Unavailable,
    /// Ask for the listed parameters. `opened` is set on the turn the session starts.
    Prompt { missing: Vec<String>, opened: bool },
    Abandoned { command: String },
    Dispatch(DispatchRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: DialogueState,
    pub effect: Effect,
}

impl Transition {
    pub fn idle(effect: Effect) -> Self {
        Self {
            next: DialogueState::Idle,
            effect,
        }
    }
}
