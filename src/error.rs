use std::collections::HashMap;

use thiserror::Error;

use crate::schedule::assign::RejectionCounts;
use crate::schedule::types::Game;

/// Why one attempt died. Steers the retry loop; only surfaces to callers
/// inside the aggregate `AttemptsExhausted` error.
#[derive(Debug, Clone)]
pub struct AttemptFailure {
    /// Human-readable reason, e.g. "no eligible pair for slot 4 (2026-01-12 7:00PM - 9:00PM, locked)".
    pub reason: String,
    /// Slot that could not be filled; None when every slot was filled but
    /// some pair count went unmet.
    pub slot_index: Option<usize>,
    /// Whether the failing slot carried a lock requirement.
    pub locked: bool,
    /// Games placed before the attempt died.
    pub partial: Vec<Game>,
    /// Per-filter rejection tallies for the failing slot, when one slot
    /// dead-ended (absent for unmet-pair failures).
    pub rejections: Option<RejectionCounts>,
}

/// Errors that reach the caller. Everything retry-recoverable stays inside
/// the retry orchestrator.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("cannot schedule: no teams provided")]
    EmptyTeams,

    #[error("cannot schedule: no slots provided")]
    EmptySlots,

    #[error("no valid schedule found in {attempts} attempts; most frequent failures: {}", format_reasons(.top_reasons))]
    AttemptsExhausted {
        attempts: u32,
        /// Up to five (reason, count) entries, most frequent first.
        top_reasons: Vec<(String, u32)>,
        /// Every attempt's failure, in attempt order.
        failures: Vec<AttemptFailure>,
    },
}

impl ScheduleError {
    /// Builds the exhaustion error from the per-attempt failure list.
    pub(crate) fn exhausted(attempts: u32, failures: Vec<AttemptFailure>) -> Self {
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for f in &failures {
            *counts.entry(f.reason.as_str()).or_insert(0) += 1;
        }
        let mut top: Vec<(String, u32)> = counts
            .into_iter()
            .map(|(r, c)| (r.to_string(), c))
            .collect();
        // Most frequent first; ties resolved by reason text for stable output
        top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top.truncate(5);
        ScheduleError::AttemptsExhausted {
            attempts,
            top_reasons: top,
            failures,
        }
    }

    /// Partial game list from the last attempt, for diagnostic output.
    pub fn last_partial(&self) -> Option<&[Game]> {
        match self {
            ScheduleError::AttemptsExhausted { failures, .. } => {
                failures.last().map(|f| f.partial.as_slice())
            }
            _ => None,
        }
    }
}

fn format_reasons(reasons: &[(String, u32)]) -> String {
    if reasons.is_empty() {
        return "(none recorded)".to_string();
    }
    reasons
        .iter()
        .map(|(r, c)| format!("{} ({}x)", r, c))
        .collect::<Vec<_>>()
        .join("; ")
}
