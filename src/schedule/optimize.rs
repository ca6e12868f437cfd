use log::debug;

use crate::rng::SeededRng;
use super::types::{Game, LockRequirements};
use super::verify::compute_home_away_balance;

/// Local-search pass over an already-placed game list, flipping home/away
/// roles to shrink the total per-team imbalance. Team membership, dates, and
/// slot labels never change, so a flip cannot introduce a doubleheader.
///
/// The lock map is keyed by each game's position in `games` (callers with
/// locks keyed by slot ordinal remap first): a lock carrying an explicit
/// side pins its game against flipping. Best-effort only; the loop stops as
/// soon as the most-imbalanced team has no flip that strictly improves its
/// own balance.
pub fn optimize(
    games: &[Game],
    locks: &LockRequirements,
    seed: &str,
    max_flips: u32,
) -> (Vec<Game>, u32) {
    let mut games: Vec<Game> = games.to_vec();
    let mut rng = SeededRng::new(seed);
    let mut flips = 0u32;

    while flips < max_flips {
        let balance = compute_home_away_balance(&games);
        let total: u64 = balance.values().map(|c| c.imbalance()).sum();
        if total == 0 {
            break;
        }

        // Most imbalanced first; ties resolved by team name so the pick is
        // stable before any randomness enters
        let mut ranked: Vec<(&String, i64)> =
            balance.iter().map(|(team, c)| (team, c.diff())).collect();
        ranked.sort_by(|a, b| b.1.abs().cmp(&a.1.abs()).then_with(|| a.0.cmp(b.0)));
        let (team, diff) = ranked[0];

        // A flip moves a team's differential by exactly 2, so anything
        // below 2 cannot strictly improve
        if diff.abs() < 2 {
            debug!(
                "optimizer stalled at total imbalance {} after {} flip(s)",
                total, flips
            );
            break;
        }

        let candidates: Vec<usize> = games
            .iter()
            .enumerate()
            .filter(|(index, game)| {
                if locks.get(index).is_some_and(|l| l.pins_roles()) {
                    return false;
                }
                let opponent = if diff > 0 {
                    // Team hosts too often: only its home games help
                    if game.home != *team {
                        return false;
                    }
                    &game.away
                } else {
                    if game.away != *team {
                        return false;
                    }
                    &game.home
                };
                // Never push an opponent further in a direction it already
                // leans: the flip hands it the same role we are shedding
                let opponent_diff = balance
                    .get(opponent)
                    .map(|c| c.diff())
                    .unwrap_or(0);
                if diff > 0 {
                    opponent_diff <= 0
                } else {
                    opponent_diff >= 0
                }
            })
            .map(|(index, _)| index)
            .collect();

        if candidates.is_empty() {
            debug!(
                "no eligible flip for {} (diff {}); stopping at {} flip(s)",
                team, diff, flips
            );
            break;
        }

        let chosen = candidates[rng.pick_index(candidates.len())];
        let game = &mut games[chosen];
        std::mem::swap(&mut game.home, &mut game.away);
        flips += 1;
    }

    (games, flips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::types::LockRequirement;
    use super::super::verify::total_imbalance;
    use chrono::NaiveDate;

    const LABEL: &str = "7:00PM - 9:00PM";

    fn game(day: u32, away: &str, home: &str) -> Game {
        Game {
            date: NaiveDate::from_ymd_opt(2026, 4, day).expect("valid date"),
            label: LABEL.to_string(),
            away: away.to_string(),
            home: home.to_string(),
        }
    }

    #[test]
    fn balanced_input_is_returned_unchanged() {
        let games = vec![game(1, "B", "A"), game(2, "A", "B")];
        let (optimized, flips) = optimize(&games, &LockRequirements::new(), "opt", 100);
        assert_eq!(flips, 0);
        assert_eq!(optimized, games);
    }

    #[test]
    fn single_flip_fixes_a_lopsided_pair() {
        // A hosts both meetings; one flip evens both teams out
        let games = vec![game(1, "B", "A"), game(2, "B", "A")];
        assert_eq!(total_imbalance(&games), 4);
        let (optimized, flips) = optimize(&games, &LockRequirements::new(), "opt", 100);
        assert_eq!(flips, 1);
        assert_eq!(total_imbalance(&optimized), 0);
    }

    #[test]
    fn pinned_game_is_never_flipped() {
        let games = vec![game(1, "B", "A"), game(2, "B", "A")];
        let mut locks = LockRequirements::new();
        locks.insert(
            0,
            LockRequirement {
                teams: vec!["A".to_string(), "B".to_string()],
                home: Some("A".to_string()),
                away: Some("B".to_string()),
            },
        );
        let (optimized, flips) = optimize(&games, &locks, "opt", 100);
        assert_eq!(flips, 1);
        // The pinned game keeps its historical roles
        assert_eq!(optimized[0].home, "A");
        assert_eq!(optimized[1].home, "B");
        assert_eq!(total_imbalance(&optimized), 0);
    }

    #[test]
    fn parity_residual_stalls_without_flipping() {
        // Every team sits at |home - away| = 1; no flip can strictly improve
        let games = vec![game(1, "B", "A")];
        let (optimized, flips) = optimize(&games, &LockRequirements::new(), "opt", 100);
        assert_eq!(flips, 0);
        assert_eq!(optimized, games);
    }

    #[test]
    fn flips_avoid_worsening_like_leaning_opponents() {
        // A is two homes over; its game against B (also over-homed) must not
        // be the one flipped.
        let games = vec![
            game(1, "B", "A"),
            game(2, "C", "A"),
            game(3, "C", "B"),
            game(4, "D", "B"),
            game(5, "D", "C"),
        ];
        let (optimized, flips) = optimize(&games, &LockRequirements::new(), "opt", 100);
        assert_eq!(optimized[0].home, "A", "A's game against B stays put");
        assert_eq!(flips, 2);
        assert_eq!(total_imbalance(&optimized), 2);
    }

    #[test]
    fn flip_budget_is_respected() {
        let games = vec![game(1, "B", "A"), game(2, "B", "A")];
        let (_, flips) = optimize(&games, &LockRequirements::new(), "opt", 0);
        assert_eq!(flips, 0);
    }

    #[test]
    fn optimizer_is_deterministic_per_seed() {
        let games = vec![
            game(1, "B", "A"),
            game(2, "C", "A"),
            game(3, "D", "A"),
            game(4, "C", "B"),
            game(5, "D", "B"),
            game(6, "D", "C"),
        ];
        let first = optimize(&games, &LockRequirements::new(), "seed-x", 100);
        let second = optimize(&games, &LockRequirements::new(), "seed-x", 100);
        assert_eq!(first, second);
    }
}
