//! Deterministic Random Number Generator
//!
//! Uses Xorshift128+ for fast, seedable randomness. Every random decision
//! the game makes (spawn cells, melee tie-breaks) goes through the
//! [`GameRng`] trait so tests can pin outcomes.

use serde::{Serialize, Deserialize};

use super::hex::Hex;

/// Source of randomness for game rules.
///
/// Implemented by [`DeterministicRng`]; tests may supply scripted sources.
pub trait GameRng: Send {
    /// Fair coin flip, used to break exact melee ties.
    fn coin_flip(&mut self) -> bool;

    /// Uniform integer in `[min, max]`.
    fn int_range(&mut self, min: i32, max: i32) -> i32;

    /// Uniform cell within `radius` steps of `center`.
    ///
    /// Samples the bounding rhombus and rejects cells outside the radius.
    fn cell_within(&mut self, center: Hex, radius: u32) -> Hex {
        let r = radius as i32;
        loop {
            let offset = Hex::new(self.int_range(-r, r), self.int_range(-r, r));
            if offset.distance(Hex::ORIGIN) <= radius {
                return center + offset;
            }
        }
    }
}

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use hex_conquest::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Simple modulo - slight bias for very large max, but acceptable
        (self.next_u64() % max as u64) as u32
    }

    /// Generate a random integer in range [min, max].
    #[inline]
    pub fn next_int_range(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        let range = (max - min + 1) as u32;
        min + self.next_int(range) as i32
    }
}

impl GameRng for DeterministicRng {
    fn coin_flip(&mut self) -> bool {
        // Top bit; the low bits of xorshift128+ are the weakest
        self.next_u64() >> 63 == 1
    }

    fn int_range(&mut self, min: i32, max: i32) -> i32 {
        self.next_int_range(min, max)
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

// =============================================================================
// TESTS
// =============================================================================
