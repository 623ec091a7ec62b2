//! Deterministic, seeded pseudo-random source.
//!
//! The reducer closure owns exactly one [`Prng`], seeded once when the
//! reducer is built. Every consumer — initial deck instantiation and the
//! `shuffle` effect — draws from that single stream in declaration order,
//! so two reducers built from the same ruleset and seed stay bit-identical
//! through any equal action sequence.

use rand_core::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Seeded 32-bit integer source with a Fisher-Yates shuffle primitive.
///
/// Lives only inside the reducer closure, never inside [`crate::state::CardGameState`]
/// — state serialization never needs to round-trip RNG stream position.
#[derive(Clone, Debug)]
pub struct Prng {
    seed: u64,
    rng: Xoshiro256PlusPlus,
}

impl Prng {
    /// Build a PRNG from a 64-bit seed. Equal seeds produce equal streams.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// The seed this stream was constructed from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Next 32-bit integer in the stream.
    pub fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    /// Uniform integer in `[0, bound)`. `bound` must be nonzero.
    pub fn below(&mut self, bound: usize) -> usize {
        debug_assert!(bound > 0, "below() requires a nonzero bound");
        (self.next_u32() as usize) % bound
    }

    /// In-place Fisher-Yates permutation.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        if items.len() < 2 {
            return;
        }
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }
}
