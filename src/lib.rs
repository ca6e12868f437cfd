//! League game scheduler.
//!
//! Assigns two-team matchups to an ordered list of time slots so that every
//! pair of teams meets a fixed number of times, no team plays twice on one
//! date, weekly frequency stays capped, home/away roles come out balanced,
//! and a preferred time-window label is spread evenly across teams. Locked
//! slots pin specific teams (and optionally roles) in place.
//!
//! The engine is a heuristic, not a solver: each attempt fills slots one by
//! one and restarts wholesale on a dead end, a seeded generator makes every
//! run reproducible, and a post-hoc local search evens out home/away roles.
//!
//! ```
//! use chrono::NaiveDate;
//! use league_scheduler::{generate, GenerateOptions, LockRequirements, Slot};
//!
//! let teams: Vec<String> = ["Bears", "Otters", "Sharks", "Wolves"]
//!     .iter().map(|t| t.to_string()).collect();
//! let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
//! let slots: Vec<Slot> = (0..6)
//!     .map(|i| Slot::new(start + chrono::Duration::weeks(i as i64), "7:00PM - 9:00PM", i as usize))
//!     .collect();
//!
//! let mut options = GenerateOptions::new("season-2026");
//! options.games_per_pair = 1;
//! let result = generate(&teams, &slots, &LockRequirements::new(), &options).unwrap();
//! assert_eq!(result.games.len(), 6);
//! ```

pub mod error;
pub mod rng;
pub mod schedule;

pub use error::{AttemptFailure, ScheduleError};
pub use rng::SeededRng;
pub use schedule::{
    compute_home_away_balance, compute_slot_fairness, generate, optimize,
    summarize_slot_distribution, total_imbalance, verify_no_doubleheaders, DoubleheaderReport,
    DoubleheaderViolation, FairnessRating, Game, GenerateOptions, HomeAwayCount, LockRequirement,
    LockRequirements, Pair, RejectionCounts, ScheduleResult, Slot, SlotFairness,
};
