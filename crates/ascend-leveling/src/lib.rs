// ABOUTME: Pure leveling engine mapping cumulative XP onto level, title and progress
// ABOUTME: Two interchangeable policies (fixed table, geometric growth) behind one trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

#![deny(unsafe_code)]

//! # Ascend Leveling
//!
//! Everything in this crate is a pure function of its input: no I/O, no
//! clocks, no hidden state. A deployment picks exactly one
//! [`LevelingPolicy`]; the policies are never mixed for the same user.
//!
//! ```rust
//! use ascend_leveling::{resolve_progression, LevelingPolicy, TieredPolicy};
//! # fn main() -> Result<(), ascend_core::errors::ProgressionError> {
//!
//! let state = resolve_progression(350)?;
//! assert_eq!(state.level, 3);
//! assert_eq!(state.title, "Habit Builder");
//!
//! let policy = TieredPolicy::standard();
//! assert_eq!(policy.resolve(350), state);
//! assert!(resolve_progression(-1).is_err());
//! # Ok(())
//! # }
//! ```

/// Geometric per-level growth policy
pub mod geometric;
/// Policy trait and shared state construction
pub mod policy;
/// Daily streak arithmetic
pub mod streak;
/// Fixed-table policy
pub mod tiered;

pub use geometric::GeometricPolicy;
pub use policy::LevelingPolicy;
pub use streak::{advance_streak, earns_streak_bonus};
pub use tiered::TieredPolicy;

use ascend_core::errors::ProgressionError;
use ascend_core::models::ProgressionState;
use std::sync::OnceLock;

/// Shared instance of the standard ten-tier policy
#[must_use]
pub fn standard_policy() -> &'static TieredPolicy {
    static STANDARD: OnceLock<TieredPolicy> = OnceLock::new();
    STANDARD.get_or_init(TieredPolicy::standard)
}

/// Resolve a cumulative XP total against the standard level table
///
/// # Errors
///
/// Returns `ProgressionError::InvalidInput` if `cumulative_xp` is negative
pub fn resolve_progression(cumulative_xp: i64) -> Result<ProgressionState, ProgressionError> {
    standard_policy().resolve_checked(cumulative_xp)
}
