//! Dialogue telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a write-only side channel. It must never be read inside
//! decision logic (state machine, matcher, dispatcher).
//!
//! # PRIVACY INVARIANT
//! Events carry ids, counts, enums and durations only. Never user text,
//! parameter values or handler output.

pub mod event;
pub mod metrics;
pub mod recorder;
