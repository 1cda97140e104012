// ABOUTME: Fixed-table leveling policy backed by an ordered list of tiers
// ABOUTME: Binary search over thresholds; the standard table spans 0 to 5500 XP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use crate::policy::{build_state, validate_tiers, LevelingPolicy};
use ascend_core::constants::levels::STANDARD_LEVELS;
use ascend_core::errors::ProgressionError;
use ascend_core::models::{LevelTier, ProgressionState};

/// Leveling policy driven by an explicit tier table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieredPolicy {
    /// Non-empty, ascending by level and threshold, first threshold 0
    tiers: Vec<LevelTier>,
}

impl TieredPolicy {
    /// Create a policy from a tier table
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::InvalidLevelTable` if the table is empty,
    /// does not start at 0 XP, or is not strictly ascending
    pub fn new(tiers: Vec<LevelTier>) -> Result<Self, ProgressionError> {
        validate_tiers(&tiers)?;
        Ok(Self { tiers })
    }

    /// The standard ten-tier table (Novice through Zenith)
    #[must_use]
    pub fn standard() -> Self {
        Self {
            tiers: STANDARD_LEVELS
                .iter()
                .map(|&(level, title, threshold)| LevelTier::new(level, title, threshold))
                .collect(),
        }
    }

    /// Borrow the tier table
    #[must_use]
    pub fn table(&self) -> &[LevelTier] {
        &self.tiers
    }

    /// Highest level in the table
    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.tiers.last().map_or(1, |tier| tier.level)
    }

    /// Threshold of a given level, if the table has it
    #[must_use]
    pub fn threshold_for(&self, level: u32) -> Option<u64> {
        self.tiers
            .iter()
            .find(|tier| tier.level == level)
            .map(|tier| tier.threshold)
    }
}

impl LevelingPolicy for TieredPolicy {
    fn name(&self) -> &'static str {
        "tiered"
    }

    fn resolve(&self, cumulative_xp: u64) -> ProgressionState {
        // First tier starts at 0, so at least one tier always matches
        let index = self
            .tiers
            .partition_point(|tier| tier.threshold <= cumulative_xp)
            .saturating_sub(1);
        let next_threshold = self.tiers.get(index + 1).map(|tier| tier.threshold);
        match self.tiers.get(index) {
            Some(current) => build_state(current, next_threshold, cumulative_xp),
            None => build_state(&LevelTier::new(1, "", 0), None, cumulative_xp),
        }
    }

    fn tiers(&self) -> Vec<LevelTier> {
        self.tiers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_table() -> TieredPolicy {
        TieredPolicy::new(vec![
            LevelTier::new(1, "Novice", 0),
            LevelTier::new(2, "Apprentice", 100),
            LevelTier::new(3, "Habit Builder", 300),
        ])
        .unwrap_or_else(|e| panic!("valid table rejected: {e}"))
    }

    #[test]
    fn test_standard_table_shape() {
        let policy = TieredPolicy::standard();
        assert_eq!(policy.table().len(), 10);
        assert_eq!(policy.max_level(), 10);
        assert_eq!(policy.threshold_for(10), Some(5_500));
        assert!(TieredPolicy::new(policy.tiers()).is_ok());
    }

    #[test]
    fn test_resolve_first_tier() {
        let state = small_table().resolve(0);
        assert_eq!(state.level, 1);
        assert_eq!(state.title, "Novice");
        assert_eq!(state.xp_required_for_level, 100);
        assert!(state.progress_fraction.abs() < f64::EPSILON);
    }

    #[test]
    fn test_resolve_just_below_threshold() {
        let state = small_table().resolve(99);
        assert_eq!(state.level, 1);
        assert_eq!(state.xp_into_level, 99);
        assert!((state.progress_fraction - 0.99).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_exact_threshold_promotes() {
        let state = small_table().resolve(300);
        assert_eq!(state.level, 3);
        assert_eq!(state.xp_into_level, 0);
    }

    #[test]
    fn test_checked_rejects_negative() {
        assert_eq!(
            small_table().resolve_checked(-1),
            Err(ProgressionError::InvalidInput { value: -1 })
        );
    }
}
