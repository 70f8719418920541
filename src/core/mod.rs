//! Core primitives.
//!
//! Stateless hex math plus the seedable randomness and hashing the game
//! layer builds on.

pub mod hex;
pub mod rng;
pub mod hash;

// Re-export core types
pub use hex::{Hex, FractionalHex, HexLayout, DIRECTIONS};
pub use rng::{DeterministicRng, GameRng};
pub use hash::{StateHash, StateHasher, compute_state_hash};
