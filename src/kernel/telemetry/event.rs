use serde::{Deserialize, Serialize};

use crate::kernel::dialogue::{ClarifyReason, SessionId};
use crate::kernel::time::Turn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    Clarification {
        reason: ClarifyReason,
    },

    /// Input arrived while the registry had nothing to match against.
    Unavailable,

    SessionOpened {
        session_id: SessionId,
        missing: usize,
        turn: Turn,
    },

    SessionProgress {
        session_id: SessionId,
        missing_before: usize,
        missing_after: usize,
    },

    SessionClosed {
        session_id: SessionId,
        reason: CloseReason,
        turns_open: u64,
    },

    Dispatch {
        outcome: DispatchOutcome,
        latency_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    Filled,
    EarlyCompletion,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchOutcome {
    Completed,
    Failed,
    Panicked,
    TimedOut,
}

impl From<&crate::error::DispatchError> for DispatchOutcome {
    fn from(err: &crate::error::DispatchError) -> Self {
        use crate::error::DispatchError;
        match err {
            DispatchError::Failed(_) => DispatchOutcome::Failed,
            DispatchError::Panicked(_) => DispatchOutcome::Panicked,
            DispatchError::TimedOut(_) => DispatchOutcome::TimedOut,
        }
    }
}
