use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single schedulable unit: one game will be placed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    /// Time-window label, e.g. "7:00PM - 9:00PM". Copied verbatim into the game.
    pub label: String,
    /// Ordinal position in the season; lock requirements address this.
    pub index: usize,
}

impl Slot {
    pub fn new(date: NaiveDate, label: impl Into<String>, index: usize) -> Self {
        Slot {
            date,
            label: label.into(),
            index,
        }
    }
}

/// An unordered team combination with a remaining-games counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    /// Stored in sorted order so (A, B) and (B, A) are the same pair.
    pub teams: (String, String),
    pub remaining: u32,
}

impl Pair {
    pub fn new(a: &str, b: &str, remaining: u32) -> Self {
        let teams = if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        };
        Pair { teams, remaining }
    }

    pub fn contains(&self, team: &str) -> bool {
        self.teams.0 == team || self.teams.1 == team
    }

    /// The other member of the pair, if `team` is one of them.
    pub fn opponent_of(&self, team: &str) -> Option<&str> {
        if self.teams.0 == team {
            Some(&self.teams.1)
        } else if self.teams.1 == team {
            Some(&self.teams.0)
        } else {
            None
        }
    }
}

/// Pins specific teams (and optionally explicit roles) to one slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockRequirement {
    /// Teams that must appear in this slot's game.
    pub teams: Vec<String>,
    /// Explicit home side carried over from a historical schedule, if known.
    pub home: Option<String>,
    /// Explicit away side carried over from a historical schedule, if known.
    pub away: Option<String>,
}

impl LockRequirement {
    pub fn for_teams(teams: &[&str]) -> Self {
        LockRequirement {
            teams: teams.iter().map(|t| t.to_string()).collect(),
            home: None,
            away: None,
        }
    }

    /// Whether this lock pins the game completely: roles are dictated, so
    /// the optimizer must not flip it.
    pub fn pins_roles(&self) -> bool {
        self.home.is_some() || self.away.is_some()
    }
}

/// Map from slot ordinal index to the lock pinned there.
pub type LockRequirements = BTreeMap<usize, LockRequirement>;

/// A placed game. Date and label are copied verbatim from the slot;
/// away/home are decided by the engine (or dictated by a lock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub date: NaiveDate,
    pub label: String,
    pub away: String,
    pub home: String,
}

impl Game {
    pub fn involves(&self, team: &str) -> bool {
        self.away == team || self.home == team
    }
}

/// Per-team home/away tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeAwayCount {
    pub home: u32,
    pub away: u32,
}

impl HomeAwayCount {
    /// Signed differential, positive when the team hosts more than it travels.
    pub fn diff(&self) -> i64 {
        self.home as i64 - self.away as i64
    }

    pub fn imbalance(&self) -> u64 {
        self.diff().unsigned_abs()
    }
}

/// Tunables for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// The time-window label whose per-team count the engine equalizes.
    pub target_slot: String,
    pub games_per_pair: u32,
    pub max_attempts: u32,
    pub max_flips: u32,
    pub seed: String,
}

impl GenerateOptions {
    pub fn new(seed: impl Into<String>) -> Self {
        GenerateOptions {
            target_slot: "7:00PM - 9:00PM".to_string(),
            games_per_pair: 3,
            max_attempts: 20,
            max_flips: 100,
            seed: seed.into(),
        }
    }
}

impl Default for GenerateOptions {
    /// Defaults with a wall-clock seed. Picked once here, at the caller
    /// boundary; the generator itself never consults external entropy.
    fn default() -> Self {
        GenerateOptions::new(chrono::Utc::now().timestamp_millis().to_string())
    }
}

/// Successful generation output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// One game per slot, in slot order.
    pub games: Vec<Game>,
    /// Per-team appearance counts in the target slot label.
    pub target_counts: BTreeMap<String, u32>,
    /// Allowed [min, max] band for target-slot appearances.
    pub target_min: u32,
    pub target_max: u32,
    pub home_away: BTreeMap<String, HomeAwayCount>,
    /// Role flips the optimizer applied.
    pub flips: u32,
    /// Zero-based attempt number that produced this schedule.
    pub attempt: u32,
    pub seed: String,
}
