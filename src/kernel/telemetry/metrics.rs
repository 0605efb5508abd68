use std::collections::VecDeque;

use super::event::{CloseReason, DispatchOutcome, TelemetryEvent};
use crate::kernel::dialogue::ClarifyReason;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub clarification_stats: ClarificationStats,
    pub session_stats: SessionStats,
    pub dispatch_stats: DispatchStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClarificationStats {
    pub empty_input: u64,
    pub no_match: u64,
    pub low_confidence: u64,
    pub unavailable: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub opened: u64,
    /// Follow-up turns answered without closing the session.
    pub progress_turns: u64,
    pub filled: u64,
    pub early_completions: u64,
    pub abandoned: u64,
    pub total_turns_open: u64,
    pub avg_turns_open: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchStats {
    pub completed: u64,
    pub failed: u64,
    pub panicked: u64,
    pub timed_out: u64,
    pub total_latency_ms: u64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: u64,
}

impl ClarificationStats {
    pub fn total(&self) -> u64 {
        self.empty_input + self.no_match + self.low_confidence + self.unavailable
    }
}

impl DispatchStats {
    pub fn total(&self) -> u64 {
        self.completed + self.failed + self.panicked + self.timed_out
    }
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();
    let mut closed_sessions = 0u64;

    for event in events {
        match event {
            TelemetryEvent::Clarification { reason } => match reason {
                ClarifyReason::EmptyInput => snap.clarification_stats.empty_input += 1,
                ClarifyReason::NoMatch => snap.clarification_stats.no_match += 1,
                ClarifyReason::LowConfidence => snap.clarification_stats.low_confidence += 1,
            },
            TelemetryEvent::Unavailable => snap.clarification_stats.unavailable += 1,
            TelemetryEvent::SessionOpened { .. } => snap.session_stats.opened += 1,
            TelemetryEvent::SessionProgress { .. } => snap.session_stats.progress_turns += 1,
            TelemetryEvent::SessionClosed { reason, turns_open, .. } => {
                match reason {
                    CloseReason::Filled => snap.session_stats.filled += 1,
                    CloseReason::EarlyCompletion => snap.session_stats.early_completions += 1,
                    CloseReason::Abandoned => snap.session_stats.abandoned += 1,
                }
                snap.session_stats.total_turns_open += turns_open;
                closed_sessions += 1;
            }
            TelemetryEvent::Dispatch { outcome, latency_ms } => {
                let stats = &mut snap.dispatch_stats;
                match outcome {
                    DispatchOutcome::Completed => stats.completed += 1,
                    DispatchOutcome::Failed => stats.failed += 1,
                    DispatchOutcome::Panicked => stats.panicked += 1,
                    DispatchOutcome::TimedOut => stats.timed_out += 1,
                }
                stats.total_latency_ms += latency_ms;
                stats.max_latency_ms = stats.max_latency_ms.max(*latency_ms);
            }
        }
    }

    // Averages
    if closed_sessions > 0 {
        snap.session_stats.avg_turns_open =
            snap.session_stats.total_turns_open as f64 / closed_sessions as f64;
    }

    let dispatches = snap.dispatch_stats.total();
    if dispatches > 0 {
        snap.dispatch_stats.avg_latency_ms =
            snap.dispatch_stats.total_latency_ms as f64 / dispatches as f64;
    }

    snap
}
