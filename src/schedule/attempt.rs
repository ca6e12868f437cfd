use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use log::debug;

use crate::error::AttemptFailure;
use crate::rng::SeededRng;
use super::assign::{assign_game, select_pair, SlotRequest};
use super::types::{Game, GenerateOptions, HomeAwayCount, LockRequirements, Pair, Slot};

/// ISO week key, so "this week" follows the calendar rather than a rolling window.
type WeekKey = (i32, u32);

fn week_of(date: NaiveDate) -> WeekKey {
    let iso = date.iso_week();
    (iso.year(), iso.week())
}

/// Everything a single attempt tracks while filling slots. Built fresh per
/// attempt and discarded wholesale on failure; whole-attempt restart is the
/// only backtracking mechanism.
struct AttemptState {
    pairs: Vec<Pair>,
    target_counts: BTreeMap<String, u32>,
    /// Games each team still needs over the whole season.
    needed: BTreeMap<String, u32>,
    home_away: BTreeMap<String, HomeAwayCount>,
    played_by_date: HashMap<NaiveDate, HashSet<String>>,
    week_counts: HashMap<WeekKey, BTreeMap<String, u32>>,
}

impl AttemptState {
    fn new(teams: &[String], games_per_pair: u32) -> Self {
        // Canonical pair order: sorted team list, nested combinations.
        // Selection scans this order, so it must never vary between runs.
        let mut pairs = Vec::new();
        for i in 0..teams.len() {
            for j in (i + 1)..teams.len() {
                pairs.push(Pair::new(&teams[i], &teams[j], games_per_pair));
            }
        }

        let per_team_needed = games_per_pair * (teams.len() as u32 - 1);
        AttemptState {
            pairs,
            target_counts: teams.iter().map(|t| (t.clone(), 0)).collect(),
            needed: teams.iter().map(|t| (t.clone(), per_team_needed)).collect(),
            home_away: teams
                .iter()
                .map(|t| (t.clone(), HomeAwayCount::default()))
                .collect(),
            played_by_date: HashMap::new(),
            week_counts: HashMap::new(),
        }
    }

    fn record(&mut self, pair_idx: usize, game: &Game, is_target_slot: bool) {
        let (a, b) = {
            let pair = &mut self.pairs[pair_idx];
            pair.remaining -= 1;
            pair.teams.clone()
        };

        for team in [&a, &b] {
            if is_target_slot {
                if let Some(c) = self.target_counts.get_mut(team.as_str()) {
                    *c += 1;
                }
            }
            if let Some(n) = self.needed.get_mut(team.as_str()) {
                *n = n.saturating_sub(1);
            }
            self.played_by_date
                .entry(game.date)
                .or_default()
                .insert(team.clone());
            *self
                .week_counts
                .entry(week_of(game.date))
                .or_default()
                .entry(team.clone())
                .or_insert(0) += 1;
        }

        if let Some(c) = self.home_away.get_mut(&game.home) {
            c.home += 1;
        }
        if let Some(c) = self.home_away.get_mut(&game.away) {
            c.away += 1;
        }
    }
}

/// What a successful attempt hands back to the retry orchestrator.
#[derive(Debug)]
pub struct AttemptOutcome {
    pub games: Vec<Game>,
    pub target_counts: BTreeMap<String, u32>,
    pub target_min: u32,
    pub target_max: u32,
    pub home_away: BTreeMap<String, HomeAwayCount>,
}

/// Allowed [min, max] band for per-team target-slot appearances:
/// mean = (2 * target slot count) / team count, floored and ceiled.
pub fn target_band(target_slot_count: usize, team_count: usize) -> (u32, u32) {
    let appearances = 2 * target_slot_count as u32;
    let teams = team_count as u32;
    let min = appearances / teams;
    let max = if appearances % teams == 0 { min } else { min + 1 };
    (min, max)
}

/// Fills every slot once, in order, threading running counts through the
/// assigner. Fails on the first slot with no eligible pair, or after the
/// last slot if any pair's remaining count is nonzero.
pub fn run_attempt(
    teams: &[String],
    slots: &[Slot],
    locks: &LockRequirements,
    locked_teams: &HashSet<String>,
    options: &GenerateOptions,
    rng: &mut SeededRng,
) -> Result<AttemptOutcome, AttemptFailure> {
    let target_slot_count = slots
        .iter()
        .filter(|s| s.label == options.target_slot)
        .count();
    let (target_min, target_max) = target_band(target_slot_count, teams.len());

    let mut state = AttemptState::new(teams, options.games_per_pair);
    let mut games: Vec<Game> = Vec::with_capacity(slots.len());

    for slot in slots {
        let lock = locks.get(&slot.index);
        let is_target_slot = slot.label == options.target_slot;

        let (chosen, rejections) = {
            let played_today = state.played_by_date.entry(slot.date).or_default();
            let week_counts = state.week_counts.entry(week_of(slot.date)).or_default();
            let request = SlotRequest {
                pairs: &state.pairs,
                is_target_slot,
                target_counts: &state.target_counts,
                target_min,
                target_max,
                needed: &state.needed,
                forced: lock.map(|l| l.teams.as_slice()),
                played_today: &*played_today,
                locked_teams,
                week_counts: &*week_counts,
            };
            select_pair(&request, rng)
        };

        let pair_idx = match chosen {
            Some(idx) => idx,
            None => {
                debug!(
                    "slot {} dead-ended ({} {}): {}",
                    slot.index,
                    slot.date,
                    slot.label,
                    rejections.describe()
                );
                return Err(AttemptFailure {
                    reason: format!(
                        "no eligible pair for slot {} ({} {}{})",
                        slot.index,
                        slot.date,
                        slot.label,
                        if lock.is_some() { ", locked" } else { "" }
                    ),
                    slot_index: Some(slot.index),
                    locked: lock.is_some(),
                    partial: games,
                    rejections: Some(rejections),
                });
            }
        };

        let game = assign_game(slot, &state.pairs[pair_idx], lock, &state.home_away, rng);
        state.record(pair_idx, &game, is_target_slot);
        games.push(game);
    }

    // Every slot filled, but the numbers may still not add up: a pair can go
    // unmet when other pairs soaked up the slot supply.
    let unmet: Vec<&Pair> = state.pairs.iter().filter(|p| p.remaining > 0).collect();
    if !unmet.is_empty() {
        return Err(AttemptFailure {
            reason: format!("all slots filled but {} pair(s) unmet", unmet.len()),
            slot_index: None,
            locked: false,
            partial: games,
            rejections: None,
        });
    }

    Ok(AttemptOutcome {
        games,
        target_counts: state.target_counts,
        target_min,
        target_max,
        home_away: state.home_away,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const TARGET: &str = "7:00PM - 9:00PM";

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn teams() -> Vec<String> {
        ["A", "B", "C", "D"].iter().map(|t| t.to_string()).collect()
    }

    /// One slot per week so the weekly cap never interferes.
    fn weekly_slots(count: usize) -> Vec<Slot> {
        (0..count)
            .map(|i| {
                let d = date(2026, 1, 5) + chrono::Duration::weeks(i as i64);
                Slot::new(d, TARGET, i)
            })
            .collect()
    }

    fn options(seed: &str, games_per_pair: u32) -> GenerateOptions {
        let mut opts = GenerateOptions::new(seed);
        opts.games_per_pair = games_per_pair;
        opts
    }

    #[test]
    fn band_splits_target_appearances_evenly() {
        assert_eq!(target_band(6, 4), (3, 3));
        assert_eq!(target_band(7, 4), (3, 4));
        assert_eq!(target_band(0, 4), (0, 0));
    }

    #[test]
    fn full_round_robin_meets_every_pair() {
        let teams = teams();
        let slots = weekly_slots(6);
        let mut rng = SeededRng::new("attempt-test");
        let outcome = run_attempt(
            &teams,
            &slots,
            &LockRequirements::new(),
            &HashSet::new(),
            &options("attempt-test", 1),
            &mut rng,
        )
        .expect("6 slots fit 6 pairs");

        assert_eq!(outcome.games.len(), 6);
        for t in &teams {
            assert_eq!(outcome.target_counts[t], 3);
        }
        // Each team appears in exactly 3 games
        for t in &teams {
            let appearances = outcome.games.iter().filter(|g| g.involves(t)).count();
            assert_eq!(appearances, 3);
        }
    }

    #[test]
    fn short_slot_supply_reports_unmet_pairs() {
        let teams = teams();
        let slots = weekly_slots(5);
        let mut rng = SeededRng::new("short");
        let err = run_attempt(
            &teams,
            &slots,
            &LockRequirements::new(),
            &HashSet::new(),
            &options("short", 1),
            &mut rng,
        )
        .expect_err("5 slots cannot fit 6 pairs");
        assert_eq!(err.slot_index, None);
        assert!(err.reason.contains("unmet"));
        assert_eq!(err.partial.len(), 5);
    }

    #[test]
    fn same_day_lock_conflict_dead_ends_with_slot_index() {
        let teams = teams();
        // Two slots share one date; a lock forces A into both.
        let shared = date(2026, 1, 5);
        let slots = vec![
            Slot::new(shared, TARGET, 0),
            Slot::new(shared, TARGET, 1),
            Slot::new(date(2026, 1, 12), TARGET, 2),
            Slot::new(date(2026, 1, 19), TARGET, 3),
            Slot::new(date(2026, 1, 26), TARGET, 4),
            Slot::new(date(2026, 2, 2), TARGET, 5),
        ];
        let mut locks = LockRequirements::new();
        locks.insert(0, super::super::types::LockRequirement::for_teams(&["A"]));
        locks.insert(1, super::super::types::LockRequirement::for_teams(&["A"]));
        let locked_teams: HashSet<String> = ["A".to_string()].into_iter().collect();

        let mut rng = SeededRng::new("conflict");
        let err = run_attempt(
            &teams,
            &slots,
            &locks,
            &locked_teams,
            &options("conflict", 1),
            &mut rng,
        )
        .expect_err("A cannot play twice on one date");
        assert_eq!(err.slot_index, Some(1));
        assert!(err.locked);
        assert_eq!(err.partial.len(), 1);
    }

    #[test]
    fn locked_team_plays_exactly_its_locked_slots() {
        let teams = teams();
        let slots = weekly_slots(6);
        // B's whole season is pinned: slots 0-2 carry all three of its games,
        // and the global lock set keeps B out of every other slot.
        let mut locks = LockRequirements::new();
        for index in 0..3 {
            locks.insert(index, super::super::types::LockRequirement::for_teams(&["B"]));
        }
        let locked_teams: HashSet<String> = ["B".to_string()].into_iter().collect();

        let mut rng = SeededRng::new("locked");
        let outcome = run_attempt(
            &teams,
            &slots,
            &locks,
            &locked_teams,
            &options("locked", 1),
            &mut rng,
        )
        .expect("feasible with B pinned to the first three slots");
        for game in &outcome.games[..3] {
            assert!(game.involves("B"));
        }
        for game in &outcome.games[3..] {
            assert!(!game.involves("B"));
        }
    }
}
