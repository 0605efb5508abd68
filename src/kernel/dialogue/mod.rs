//! Slot-filling state machine.
//!
//! Two states: `Idle` and `AwaitingParams`. Transitions are pure; the engine
//! owns the state value and executes whatever effect a transition returns.

pub mod machine;
pub mod types;

pub use machine::{DialogueContext, DialogueMachine};
pub use types::*;
