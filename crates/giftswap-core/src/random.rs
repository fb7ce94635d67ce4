//! Injectable random choice.
//!
//! The search never reaches for a global RNG. Callers hand in a
//! [`RandomSource`]: [`ThreadRandom`] in production, [`SeededRandom`] when a
//! draw has to be reproducible, or a scripted source in tests.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

/// Capability to pick an index uniformly at random.
pub trait RandomSource {
    /// Return an index in `0..len`. Callers never pass `len == 0`.
    fn pick(&mut self, len: usize) -> usize;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn pick(&mut self, len: usize) -> usize {
        (**self).pick(len)
    }
}

/// Fisher-Yates shuffle driven by `rng`.
pub fn shuffle<R: RandomSource + ?Sized, T>(rng: &mut R, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.pick(i + 1);
        items.swap(i, j);
    }
}

/// Thread-local OS-seeded RNG. Not reproducible.
#[derive(Debug, Clone)]
pub struct ThreadRandom(ThreadRng);

impl ThreadRandom {
    pub fn new() -> Self {
        Self(rand::thread_rng())
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn pick(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}

/// Seeded RNG; the same seed replays the same choices.
#[derive(Debug, Clone)]
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn pick(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}
