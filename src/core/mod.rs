//! Core deterministic primitives.
//!
//! Nothing here depends on time, randomness or platform: identical snapshots
//! hash identically everywhere.

pub mod hash;

// Re-export core types
pub use hash::{compute_state_hash, StateHash, StateHasher};
