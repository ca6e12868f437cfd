use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{Game, HomeAwayCount};

/// Qualitative rating of a slot distribution, keyed off its min-max range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FairnessRating {
    Perfect,
    Excellent,
    Good,
    Fair,
    Poor,
}

impl FairnessRating {
    fn from_range(range: u32) -> Self {
        match range {
            0 => FairnessRating::Perfect,
            1 => FairnessRating::Excellent,
            2 => FairnessRating::Good,
            3 => FairnessRating::Fair,
            _ => FairnessRating::Poor,
        }
    }
}

impl std::fmt::Display for FairnessRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FairnessRating::Perfect => "Perfect",
            FairnessRating::Excellent => "Excellent",
            FairnessRating::Good => "Good",
            FairnessRating::Fair => "Fair",
            FairnessRating::Poor => "Poor",
        };
        f.write_str(s)
    }
}

/// How evenly one slot label is spread across teams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotFairness {
    pub min: u32,
    pub max: u32,
    pub mean: f64,
    pub std_dev: f64,
    pub rating: FairnessRating,
    /// True when max - min stays below 3.
    pub fair: bool,
}

/// Per-team appearance count in the given slot label, alphabetically keyed.
/// Every team present anywhere in the game list gets an entry, zero included.
pub fn summarize_slot_distribution(games: &[Game], slot_label: &str) -> BTreeMap<String, u32> {
    let mut distribution: BTreeMap<String, u32> = BTreeMap::new();
    for game in games {
        distribution.entry(game.away.clone()).or_insert(0);
        distribution.entry(game.home.clone()).or_insert(0);
        if game.label == slot_label {
            for team in [&game.away, &game.home] {
                *distribution.entry(team.clone()).or_insert(0) += 1;
            }
        }
    }
    distribution
}

/// Rates how evenly the given slot label is distributed across teams.
pub fn compute_slot_fairness(games: &[Game], slot_label: &str) -> SlotFairness {
    let distribution = summarize_slot_distribution(games, slot_label);
    fairness_of(distribution.values().copied().collect::<Vec<_>>().as_slice())
}

fn fairness_of(counts: &[u32]) -> SlotFairness {
    if counts.is_empty() {
        return SlotFairness {
            min: 0,
            max: 0,
            mean: 0.0,
            std_dev: 0.0,
            rating: FairnessRating::Perfect,
            fair: true,
        };
    }

    let min = counts.iter().copied().min().unwrap_or(0);
    let max = counts.iter().copied().max().unwrap_or(0);
    let mean = counts.iter().map(|&c| c as f64).sum::<f64>() / counts.len() as f64;
    let variance = counts
        .iter()
        .map(|&c| (c as f64 - mean).powi(2))
        .sum::<f64>()
        / counts.len() as f64;
    let range = max - min;

    SlotFairness {
        min,
        max,
        mean,
        std_dev: variance.sqrt(),
        rating: FairnessRating::from_range(range),
        fair: range < 3,
    }
}

/// Per-team home/away tallies over a finished game list, alphabetically keyed.
pub fn compute_home_away_balance(games: &[Game]) -> BTreeMap<String, HomeAwayCount> {
    let mut balance: BTreeMap<String, HomeAwayCount> = BTreeMap::new();
    for game in games {
        balance.entry(game.home.clone()).or_default().home += 1;
        balance.entry(game.away.clone()).or_default().away += 1;
    }
    balance
}

/// Sum over teams of |home - away|.
pub fn total_imbalance(games: &[Game]) -> u64 {
    compute_home_away_balance(games)
        .values()
        .map(|c| c.imbalance())
        .sum()
}

/// A team that appears in more than one game on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleheaderViolation {
    pub date: NaiveDate,
    pub team: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoubleheaderReport {
    pub valid: bool,
    pub violations: Vec<DoubleheaderViolation>,
}

/// Checks the hard same-day exclusion over a finished game list.
pub fn verify_no_doubleheaders(games: &[Game]) -> DoubleheaderReport {
    // BTreeMap keeps violations sorted by date then team
    let mut per_date: BTreeMap<(NaiveDate, String), u32> = BTreeMap::new();
    for game in games {
        for team in [&game.away, &game.home] {
            *per_date.entry((game.date, team.clone())).or_insert(0) += 1;
        }
    }

    let violations: Vec<DoubleheaderViolation> = per_date
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|((date, team), count)| DoubleheaderViolation { date, team, count })
        .collect();

    DoubleheaderReport {
        valid: violations.is_empty(),
        violations,
    }
}
