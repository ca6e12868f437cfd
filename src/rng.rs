/// Seeded pseudo-random generator used for all tie-breaking and coin flips.
///
/// Every randomized choice in the scheduler routes through one of these so
/// that the same seed string always reproduces the same schedule. The seed
/// is folded byte-wise and avalanched into a 32-bit state; each call
/// advances the state with a fixed recurrence (mulberry32) and extracts a
/// uniform value in [0, 1).
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u32,
}

/// Hashes an arbitrary seed string into a well-mixed 32-bit state.
fn hash_seed(seed: &str) -> u32 {
    let mut h: u32 = 0x811c9dc5;
    for &b in seed.as_bytes() {
        h ^= b as u32;
        h = h.wrapping_mul(0x0100_0193);
    }
    // Final avalanche so short seeds still scatter across the state space
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

impl SeededRng {
    pub fn new(seed: &str) -> Self {
        SeededRng {
            state: hash_seed(seed),
        }
    }

    /// Returns the next uniform deviate in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        out as f64 / 4_294_967_296.0
    }

    /// Fair coin flip.
    pub fn coin_flip(&mut self) -> bool {
        self.next_f64() < 0.5
    }

    /// Uniform index into a collection of `len` elements. `len` must be > 0.
    pub fn pick_index(&mut self, len: usize) -> usize {
        let idx = (self.next_f64() * len as f64) as usize;
        // next_f64 is strictly below 1.0 but guard against float edge cases
        idx.min(len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SeededRng::new("t1");
        let mut b = SeededRng::new("t1");
        for _ in 0..1000 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SeededRng::new("t1");
        let mut b = SeededRng::new("t2");
        let first: Vec<f64> = (0..10).map(|_| a.next_f64()).collect();
        let second: Vec<f64> = (0..10).map(|_| b.next_f64()).collect();
        assert_ne!(first, second);
    }

    #[test]
    fn values_stay_in_unit_interval() {
        let mut rng = SeededRng::new("range-check");
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "out of range: {}", v);
        }
    }

    #[test]
    fn pick_index_covers_all_slots() {
        let mut rng = SeededRng::new("pick");
        let mut seen = [false; 5];
        for _ in 0..500 {
            seen[rng.pick_index(5)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
