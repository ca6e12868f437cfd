use std::collections::HashSet;

use log::{debug, warn};

use crate::error::{AttemptFailure, ScheduleError};
use crate::rng::SeededRng;
use super::attempt::run_attempt;
use super::optimize::optimize;
use super::types::{GenerateOptions, LockRequirements, ScheduleResult, Slot};
use super::verify::{compute_home_away_balance, verify_no_doubleheaders};

/// Generates a full season schedule.
///
/// Repeats whole attempts with per-attempt derived seeds until one produces
/// a complete, doubleheader-free schedule, then runs the home/away
/// optimizer over it. Identical inputs and seed always produce the same
/// schedule.
///
/// Only input validation and retry-budget exhaustion surface as errors;
/// individual attempt failures just trigger the next attempt.
pub fn generate(
    teams: &[String],
    slots: &[Slot],
    locks: &LockRequirements,
    options: &GenerateOptions,
) -> Result<ScheduleResult, ScheduleError> {
    if teams.is_empty() {
        return Err(ScheduleError::EmptyTeams);
    }
    if slots.is_empty() {
        return Err(ScheduleError::EmptySlots);
    }

    // Fixed iteration order everywhere a random tie-break can happen
    let mut sorted_teams: Vec<String> = teams.to_vec();
    sorted_teams.sort();

    // Teams named by any lock only ever play in their locked slots
    let locked_teams: HashSet<String> = locks
        .values()
        .flat_map(|lock| lock.teams.iter().cloned())
        .collect();

    // Locks are keyed by slot ordinal, but the optimizer addresses games by
    // their position in the list; remap so role pins hold even when slot
    // ordinals are not 0..n-1 in order
    let positional_locks: LockRequirements = slots
        .iter()
        .enumerate()
        .filter_map(|(position, slot)| {
            locks.get(&slot.index).map(|lock| (position, lock.clone()))
        })
        .collect();

    let mut failures: Vec<AttemptFailure> = Vec::new();

    for attempt in 0..options.max_attempts {
        // Per-attempt seed, derived deterministically from the base seed
        let attempt_seed = format!("{}#{}", options.seed, attempt);
        let mut rng = SeededRng::new(&attempt_seed);

        let outcome = match run_attempt(
            &sorted_teams,
            slots,
            locks,
            &locked_teams,
            options,
            &mut rng,
        ) {
            Ok(outcome) => outcome,
            Err(failure) => {
                debug!("attempt {} failed: {}", attempt, failure.reason);
                failures.push(failure);
                continue;
            }
        };

        // The assigner's same-day filter should make this impossible; treat
        // a hit as a failed attempt rather than trusting the filter
        let check = verify_no_doubleheaders(&outcome.games);
        if !check.valid {
            warn!(
                "attempt {} produced {} doubleheader violation(s) despite filters",
                attempt,
                check.violations.len()
            );
            failures.push(AttemptFailure {
                reason: "doubleheader slipped through the assignment filters".to_string(),
                slot_index: None,
                locked: false,
                partial: outcome.games,
                rejections: None,
            });
            continue;
        }

        let (optimized, flips) = optimize(
            &outcome.games,
            &positional_locks,
            &format!("{}#opt", attempt_seed),
            options.max_flips,
        );

        // A flip cannot move a team across dates, but re-check anyway; a
        // regression discards the optimizer's output entirely
        let (games, flips) = if verify_no_doubleheaders(&optimized).valid {
            (optimized, flips)
        } else {
            warn!("optimizer output regressed; keeping unoptimized schedule");
            (outcome.games, 0)
        };

        debug!(
            "schedule found on attempt {} with {} optimizer flip(s)",
            attempt, flips
        );
        return Ok(ScheduleResult {
            home_away: compute_home_away_balance(&games),
            games,
            target_counts: outcome.target_counts,
            target_min: outcome.target_min,
            target_max: outcome.target_max,
            flips,
            attempt,
            seed: options.seed.clone(),
        });
    }

    warn!(
        "no valid schedule after {} attempt(s); giving up",
        options.max_attempts
    );
    Err(ScheduleError::exhausted(options.max_attempts, failures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const TARGET: &str = "7:00PM - 9:00PM";

    fn teams() -> Vec<String> {
        ["A", "B", "C", "D"].iter().map(|t| t.to_string()).collect()
    }

    fn weekly_slots(count: usize) -> Vec<Slot> {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid date");
        (0..count)
            .map(|i| Slot::new(start + chrono::Duration::weeks(i as i64), TARGET, i))
            .collect()
    }

    fn options(seed: &str, games_per_pair: u32) -> GenerateOptions {
        let mut opts = GenerateOptions::new(seed);
        opts.games_per_pair = games_per_pair;
        opts
    }

    #[test]
    fn empty_inputs_fail_fast() {
        let slots = weekly_slots(6);
        assert!(matches!(
            generate(&[], &slots, &LockRequirements::new(), &options("s", 1)),
            Err(ScheduleError::EmptyTeams)
        ));
        assert!(matches!(
            generate(&teams(), &[], &LockRequirements::new(), &options("s", 1)),
            Err(ScheduleError::EmptySlots)
        ));
    }

    #[test]
    fn result_reports_attempt_and_seed() {
        let result = generate(
            &teams(),
            &weekly_slots(6),
            &LockRequirements::new(),
            &options("report", 1),
        )
        .expect("feasible season");
        assert_eq!(result.seed, "report");
        assert_eq!(result.attempt, 0);
        assert_eq!(result.games.len(), 6);
        assert_eq!((result.target_min, result.target_max), (3, 3));
    }

    #[test]
    fn unsorted_team_input_does_not_change_output() {
        let shuffled: Vec<String> =
            ["D", "B", "A", "C"].iter().map(|t| t.to_string()).collect();
        let slots = weekly_slots(6);
        let opts = options("order", 1);
        let a = generate(&teams(), &slots, &LockRequirements::new(), &opts)
            .expect("feasible season");
        let b = generate(&shuffled, &slots, &LockRequirements::new(), &opts)
            .expect("feasible season");
        assert_eq!(a.games, b.games);
    }

    #[test]
    fn exhaustion_aggregates_failure_reasons() {
        // 5 slots can never satisfy 6 pairs, so every attempt fails the
        // same way and the aggregate reflects that
        let mut opts = options("hopeless", 1);
        opts.max_attempts = 4;
        let err = generate(&teams(), &weekly_slots(5), &LockRequirements::new(), &opts)
            .expect_err("slot supply is short");
        // Every slot got a game; only the pair arithmetic failed
        assert_eq!(err.last_partial().map(|p| p.len()), Some(5));
        match err {
            ScheduleError::AttemptsExhausted {
                attempts,
                top_reasons,
                failures,
            } => {
                assert_eq!(attempts, 4);
                assert_eq!(failures.len(), 4);
                assert_eq!(top_reasons.len(), 1);
                assert_eq!(top_reasons[0].1, 4);
                assert!(top_reasons[0].0.contains("unmet"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
