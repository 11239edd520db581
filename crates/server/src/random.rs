//! Injectable randomness.
//!
//! Fallback replies and forum aliases are picked through [`RandomSource`]
//! so tests can pin the choice.

use rand::Rng;

pub trait RandomSource: Send + Sync {
    /// An index in `0..len`. Returns 0 when `len` is 0.
    fn pick(&self, len: usize) -> usize;
}

/// Thread-local generator from `rand`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        rand::rng().random_range(0..len)
    }
}

/// Always returns the same index (clamped to the range).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedRandom(pub usize);

impl RandomSource for FixedRandom {
    fn pick(&self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}

/// Pick one element of a non-empty slice.
pub fn choose<'a, T, R: RandomSource + ?Sized>(random: &R, items: &'a [T]) -> Option<&'a T> {
    items.get(random.pick(items.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_random_stays_in_range() {
        for _ in 0..200 {
            assert!(ThreadRandom.pick(4) < 4);
        }
        assert_eq!(ThreadRandom.pick(0), 0);
    }

    #[test]
    fn test_fixed_random_clamps() {
        assert_eq!(FixedRandom(2).pick(4), 2);
        assert_eq!(FixedRandom(9).pick(4), 3);
        assert_eq!(choose(&FixedRandom(1), &["a", "b"]), Some(&"b"));
        assert_eq!(choose::<&str, _>(&FixedRandom(0), &[]), None);
    }
}
