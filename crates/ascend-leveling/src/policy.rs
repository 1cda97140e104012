// ABOUTME: LevelingPolicy trait shared by the tiered and geometric strategies
// ABOUTME: Builds ProgressionState with max-tier extrapolation and clamped progress
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use ascend_core::constants::levels::MAX_TIER_EXTRAPOLATION_DIVISOR;
use ascend_core::errors::ProgressionError;
use ascend_core::models::{LevelTier, ProgressionState};
use std::fmt::Debug;

/// Strategy mapping cumulative XP onto a level
///
/// Implementations must be pure: the same total always yields the same state.
pub trait LevelingPolicy: Send + Sync + Debug {
    /// Short policy name for logs and configuration
    fn name(&self) -> &'static str;

    /// Resolve an already validated total
    fn resolve(&self, cumulative_xp: u64) -> ProgressionState;

    /// The full tier table this policy uses, in ascending order
    fn tiers(&self) -> Vec<LevelTier>;

    /// Resolve a total received at an untrusted boundary
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::InvalidInput` if `cumulative_xp` is negative
    fn resolve_checked(&self, cumulative_xp: i64) -> Result<ProgressionState, ProgressionError> {
        let xp = u64::try_from(cumulative_xp).map_err(|_| ProgressionError::InvalidInput {
            value: cumulative_xp,
        })?;
        Ok(self.resolve(xp))
    }

    /// Level reached at `cumulative_xp`
    fn level_for(&self, cumulative_xp: u64) -> u32 {
        self.resolve(cumulative_xp).level
    }
}

/// Build the derived state for `xp` sitting in `current`.
///
/// `next_threshold` is `None` at the last tier; the next threshold is then
/// extrapolated to 1.5x the total, and a zero-width window is widened to 1.
#[must_use]
pub fn build_state(current: &LevelTier, next_threshold: Option<u64>, xp: u64) -> ProgressionState {
    let next_level_xp = next_threshold
        .unwrap_or_else(|| xp.saturating_add(xp / MAX_TIER_EXTRAPOLATION_DIVISOR));
    let xp_into_level = xp.saturating_sub(current.threshold);
    let xp_required_for_level = next_level_xp.saturating_sub(current.threshold).max(1);

    let fraction = xp_into_level as f64 / xp_required_for_level as f64;
    let progress_fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };

    ProgressionState {
        level: current.level,
        title: current.title.clone(),
        current_xp: xp,
        next_level_xp: next_level_xp.max(current.threshold.saturating_add(1)),
        xp_into_level,
        xp_required_for_level,
        progress_fraction,
    }
}

/// Validate an ascending tier table
///
/// # Errors
///
/// Returns `ProgressionError::InvalidLevelTable` if the table is empty, does
/// not start at threshold 0, or levels/thresholds are not strictly increasing
pub fn validate_tiers(tiers: &[LevelTier]) -> Result<(), ProgressionError> {
    let Some(first) = tiers.first() else {
        return Err(ProgressionError::invalid_table("table has no tiers"));
    };
    if first.threshold != 0 {
        return Err(ProgressionError::invalid_table(format!(
            "first tier must start at 0 XP, found {}",
            first.threshold
        )));
    }
    if first.level == 0 {
        return Err(ProgressionError::invalid_table("levels must be positive"));
    }
    for pair in tiers.windows(2) {
        if let [previous, next] = pair {
            if next.level <= previous.level {
                return Err(ProgressionError::invalid_table(format!(
                    "level {} follows level {}",
                    next.level, previous.level
                )));
            }
            if next.threshold <= previous.threshold {
                return Err(ProgressionError::invalid_table(format!(
                    "threshold {} for level {} does not exceed {}",
                    next.threshold, next.level, previous.threshold
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_state_within_table() {
        let tier = LevelTier::new(2, "Apprentice", 100);
        let state = build_state(&tier, Some(300), 150);
        assert_eq!(state.xp_into_level, 50);
        assert_eq!(state.xp_required_for_level, 200);
        assert!((state.progress_fraction - 0.25).abs() < f64::EPSILON);
        assert_eq!(state.next_level_xp, 300);
    }

    #[test]
    fn test_build_state_extrapolates_past_last_tier() {
        let tier = LevelTier::new(3, "Habit Builder", 300);
        let state = build_state(&tier, None, 500);
        assert_eq!(state.next_level_xp, 750);
        assert_eq!(state.xp_required_for_level, 450);
        assert_eq!(state.xp_into_level, 200);
    }

    #[test]
    fn test_build_state_zero_width_window() {
        let tier = LevelTier::new(1, "Only", 0);
        let state = build_state(&tier, None, 0);
        assert_eq!(state.xp_required_for_level, 1);
        assert!(state.progress_fraction.abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_rejects_unordered_tables() {
        assert!(validate_tiers(&[]).is_err());
        assert!(validate_tiers(&[LevelTier::new(1, "A", 10)]).is_err());
        assert!(validate_tiers(&[LevelTier::new(1, "A", 0), LevelTier::new(2, "B", 0)]).is_err());
        assert!(validate_tiers(&[LevelTier::new(2, "A", 0), LevelTier::new(1, "B", 5)]).is_err());
        assert!(validate_tiers(&[LevelTier::new(1, "A", 0), LevelTier::new(2, "B", 5)]).is_ok());
    }
}
