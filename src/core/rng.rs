//! Deterministic random number generation for the local backend.
//!
//! Board layouts and the baseline move policy draw from a seeded ChaCha8
//! stream so matches and experiment batches are reproducible.
//!
//! ```
//! use smart_horses::core::GameRng;
//!
//! let mut a = GameRng::new(7);
//! let mut b = GameRng::new(7);
//! assert_eq!(a.sample_distinct(64, 16), b.sample_distinct(64, 16));
//! ```

use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded RNG with forking for independent games.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// Seed this RNG was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fork an independent, deterministic stream (one per experiment game).
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self
            .seed
            .wrapping_add(self.fork_counter.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Self::new(fork_seed)
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        slice.choose(&mut self.inner)
    }

    /// Draw `amount` distinct indices from `0..length`, in draw order.
    ///
    /// Returns fewer than `amount` only if `length < amount`.
    pub fn sample_distinct(&mut self, length: usize, amount: usize) -> Vec<usize> {
        let amount = amount.min(length);
        index::sample(&mut self.inner, length, amount).into_vec()
    }
}
