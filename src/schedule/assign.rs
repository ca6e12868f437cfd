use std::collections::{BTreeMap, HashSet};

use crate::rng::SeededRng;
use super::types::{Game, HomeAwayCount, LockRequirement, Pair, Slot};

/// Hard cap on unforced games per team per calendar week.
pub const WEEKLY_HARD_CAP: u32 = 2;

/// Everything the assigner needs to know about one slot and the attempt so far.
pub struct SlotRequest<'a> {
    pub pairs: &'a [Pair],
    /// Whether the current slot carries the target time-window label.
    pub is_target_slot: bool,
    pub target_counts: &'a BTreeMap<String, u32>,
    pub target_min: u32,
    pub target_max: u32,
    /// Games each team still needs across the whole season.
    pub needed: &'a BTreeMap<String, u32>,
    /// Teams a lock forces into this slot, if any.
    pub forced: Option<&'a [String]>,
    /// Teams already playing on this slot's date.
    pub played_today: &'a HashSet<String>,
    /// Teams appearing in any lock anywhere in the season.
    pub locked_teams: &'a HashSet<String>,
    /// Per-team game counts for this slot's calendar week.
    pub week_counts: &'a BTreeMap<String, u32>,
}

/// How many pairs each eligibility rule rejected, for failure diagnostics.
/// Rules short-circuit, so each rejected pair counts against exactly one rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub exhausted_pair: u32,
    pub missing_forced_team: u32,
    pub played_today: u32,
    pub reserved_for_lock: u32,
    pub weekly_cap: u32,
    pub target_cap: u32,
}

impl RejectionCounts {
    pub fn describe(&self) -> String {
        format!(
            "exhausted={} missing-forced={} played-today={} reserved={} weekly-cap={} target-cap={}",
            self.exhausted_pair,
            self.missing_forced_team,
            self.played_today,
            self.reserved_for_lock,
            self.weekly_cap,
            self.target_cap
        )
    }
}

fn count_for(map: &BTreeMap<String, u32>, team: &str) -> u32 {
    map.get(team).copied().unwrap_or(0)
}

/// Checks one pair against the eligibility rules, short-circuiting on the
/// first failure. Same-day exclusion applies even to forced slots; the
/// lock-reservation, weekly-cap, and target-cap rules apply only when the
/// slot is not forced.
fn is_eligible(pair: &Pair, req: &SlotRequest, rejections: &mut RejectionCounts) -> bool {
    let (a, b) = (&pair.teams.0, &pair.teams.1);

    if pair.remaining == 0 {
        rejections.exhausted_pair += 1;
        return false;
    }

    if let Some(forced) = req.forced {
        if !forced.iter().all(|t| pair.contains(t)) {
            rejections.missing_forced_team += 1;
            return false;
        }
    }

    // Same-day exclusion outranks locks: even a forced pair cannot play twice
    if req.played_today.contains(a) || req.played_today.contains(b) {
        rejections.played_today += 1;
        return false;
    }

    if req.forced.is_none() {
        // Teams pinned somewhere by a lock only play in their locked slots
        if req.locked_teams.contains(a) || req.locked_teams.contains(b) {
            rejections.reserved_for_lock += 1;
            return false;
        }

        if count_for(req.week_counts, a) >= WEEKLY_HARD_CAP
            || count_for(req.week_counts, b) >= WEEKLY_HARD_CAP
        {
            rejections.weekly_cap += 1;
            return false;
        }

        if req.is_target_slot
            && (count_for(req.target_counts, a) + 1 > req.target_max
                || count_for(req.target_counts, b) + 1 > req.target_max)
        {
            rejections.target_cap += 1;
            return false;
        }
    }

    true
}

/// Scores one eligible pair. Higher wins.
fn score_pair(pair: &Pair, req: &SlotRequest, rng: &mut SeededRng) -> f64 {
    let (a, b) = (&pair.teams.0, &pair.teams.1);

    let deficit = |team: &str| -> f64 {
        let count = count_for(req.target_counts, team);
        (req.target_min.saturating_sub(count)) as f64
    };
    let deficits = deficit(a) + deficit(b);

    let target_term = if req.is_target_slot {
        3.0 * deficits
    } else {
        -0.2 * deficits
    };
    let games_left_term =
        0.02 * (count_for(req.needed, a) + count_for(req.needed, b)) as f64;
    let weekly_penalty =
        -2.0 * (count_for(req.week_counts, a) + count_for(req.week_counts, b)) as f64;
    let jitter = rng.next_f64() * 0.05;

    pair.remaining as f64 + target_term + games_left_term + weekly_penalty + jitter
}

/// Picks the best pair for a slot, or None when nothing is eligible.
///
/// Returns the winning pair's index into `req.pairs` alongside the per-rule
/// rejection tally. Pairs are scanned in their canonical sorted order so
/// generator consumption is identical for identical inputs.
pub fn select_pair(req: &SlotRequest, rng: &mut SeededRng) -> (Option<usize>, RejectionCounts) {
    let mut rejections = RejectionCounts::default();

    let mut best_score = f64::NEG_INFINITY;
    let mut best: Vec<usize> = Vec::new();
    for (idx, pair) in req.pairs.iter().enumerate() {
        if !is_eligible(pair, req, &mut rejections) {
            continue;
        }
        let score = score_pair(pair, req, rng);
        if score > best_score {
            best_score = score;
            best.clear();
            best.push(idx);
        } else if score == best_score {
            best.push(idx);
        }
    }

    match best.len() {
        0 => (None, rejections),
        1 => (Some(best[0]), rejections),
        // Exact ties broken uniformly at random
        n => (Some(best[rng.pick_index(n)]), rejections),
    }
}

/// Materializes the game for a slot once the pair is chosen.
///
/// An explicit lock side wins outright; a missing side is filled with the
/// pair's other team. A lock that names teams without sides gives no role
/// information, so it falls through to the balance logic: when the two
/// teams' home-minus-away differentials differ by more than 1 the
/// lower-differential team hosts, otherwise a fair coin decides.
pub fn assign_game(
    slot: &Slot,
    pair: &Pair,
    lock: Option<&LockRequirement>,
    home_away: &BTreeMap<String, HomeAwayCount>,
    rng: &mut SeededRng,
) -> Game {
    let (a, b) = (pair.teams.0.clone(), pair.teams.1.clone());

    if let Some(lock) = lock.filter(|l| l.pins_roles()) {
        let home = lock
            .home
            .clone()
            .filter(|h| pair.contains(h))
            .or_else(|| {
                lock.away
                    .as_deref()
                    .and_then(|away| pair.opponent_of(away))
                    .map(|t| t.to_string())
            });
        if let Some(home) = home {
            let away = pair
                .opponent_of(&home)
                .map(|t| t.to_string())
                .unwrap_or_else(|| b.clone());
            return Game {
                date: slot.date,
                label: slot.label.clone(),
                away,
                home,
            };
        }
        // Lock sides name teams outside the pair; treat as unpinned
    }

    let diff = |team: &str| home_away.get(team).copied().unwrap_or_default().diff();
    let (diff_a, diff_b) = (diff(&a), diff(&b));

    let a_hosts = if (diff_a - diff_b).abs() > 1 {
        diff_a < diff_b
    } else {
        rng.coin_flip()
    };

    let (home, away) = if a_hosts { (a, b) } else { (b, a) };
    Game {
        date: slot.date,
        label: slot.label.clone(),
        away,
        home,
    }
}
