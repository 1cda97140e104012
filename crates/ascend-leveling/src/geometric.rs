// ABOUTME: Geometric leveling policy where each level costs a fixed multiple of the last
// ABOUTME: Precomputes thresholds once and delegates lookups to a tier table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use crate::policy::LevelingPolicy;
use crate::tiered::TieredPolicy;
use ascend_core::constants::levels::{
    DEFAULT_GEOMETRIC_BASE_XP, DEFAULT_GEOMETRIC_MAX_LEVEL, DEFAULT_GEOMETRIC_MULTIPLIER,
    STANDARD_LEVELS,
};
use ascend_core::errors::ProgressionError;
use ascend_core::models::{LevelTier, ProgressionState};
use tracing::debug;

/// Leveling policy with geometrically growing level increments
///
/// Level 1 starts at 0, level 2 at `base_xp`, and every following increment
/// is the previous one times `multiplier`, rounded down. With the defaults
/// (100, x1.5) the thresholds are 0, 100, 250, 475, 812, ...
#[derive(Debug, Clone, PartialEq)]
pub struct GeometricPolicy {
    base_xp: u64,
    multiplier: f64,
    table: TieredPolicy,
}

impl GeometricPolicy {
    /// Create a geometric policy
    ///
    /// Titles are assigned in order; levels past the end of `titles` reuse
    /// the last title with the level number appended.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::InvalidLevelTable` if `base_xp` is zero,
    /// `multiplier` is below 1 or not finite, `max_level` is zero, or
    /// `titles` is empty
    pub fn new(
        base_xp: u64,
        multiplier: f64,
        max_level: u32,
        titles: &[&str],
    ) -> Result<Self, ProgressionError> {
        if base_xp == 0 {
            return Err(ProgressionError::invalid_table("base XP must be positive"));
        }
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(ProgressionError::invalid_table(format!(
                "multiplier must be a finite value >= 1, got {multiplier}"
            )));
        }
        if max_level == 0 {
            return Err(ProgressionError::invalid_table("max level must be positive"));
        }
        let Some(last_title) = titles.last() else {
            return Err(ProgressionError::invalid_table("at least one title is required"));
        };

        let mut tiers = Vec::with_capacity(max_level as usize);
        let mut threshold = 0_u64;
        let mut increment = base_xp;
        for level in 1..=max_level {
            let title = titles.get(level as usize - 1).map_or_else(
                || format!("{last_title} {level}"),
                |title| (*title).to_owned(),
            );
            tiers.push(LevelTier::new(level, title, threshold));

            let Some(next) = threshold.checked_add(increment) else {
                debug!(level, "geometric thresholds saturated, truncating table");
                break;
            };
            threshold = next;
            increment = (increment as f64 * multiplier).floor() as u64;
        }

        Ok(Self {
            base_xp,
            multiplier,
            table: TieredPolicy::new(tiers)?,
        })
    }

    /// Defaults: 100 XP base, x1.5 growth, 50 levels, standard titles
    ///
    /// # Errors
    ///
    /// Never fails with the built-in defaults; the `Result` mirrors [`Self::new`]
    pub fn standard() -> Result<Self, ProgressionError> {
        let titles: Vec<&str> = STANDARD_LEVELS.iter().map(|&(_, title, _)| title).collect();
        Self::new(
            DEFAULT_GEOMETRIC_BASE_XP,
            DEFAULT_GEOMETRIC_MULTIPLIER,
            DEFAULT_GEOMETRIC_MAX_LEVEL,
            &titles,
        )
    }

    /// XP needed to reach level 2
    #[must_use]
    pub const fn base_xp(&self) -> u64 {
        self.base_xp
    }

    /// Per-level growth factor
    #[must_use]
    pub const fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Highest generated level
    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.table.max_level()
    }
}

impl LevelingPolicy for GeometricPolicy {
    fn name(&self) -> &'static str {
        "geometric"
    }

    fn resolve(&self, cumulative_xp: u64) -> ProgressionState {
        self.table.resolve(cumulative_xp)
    }

    fn tiers(&self) -> Vec<LevelTier> {
        self.table.tiers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> GeometricPolicy {
        GeometricPolicy::standard().unwrap_or_else(|e| panic!("defaults rejected: {e}"))
    }

    #[test]
    fn test_default_thresholds() {
        let thresholds: Vec<u64> = policy().tiers().iter().take(5).map(|t| t.threshold).collect();
        assert_eq!(thresholds, vec![0, 100, 250, 475, 812]);
    }

    #[test]
    fn test_titles_extend_past_list() {
        let tiers = policy().tiers();
        assert_eq!(tiers[0].title, "Novice");
        assert_eq!(tiers[9].title, "Zenith");
        assert_eq!(tiers[10].title, "Zenith 11");
        assert_eq!(policy().max_level(), 50);
    }

    #[test]
    fn test_resolve_between_levels() {
        let state = policy().resolve(300);
        assert_eq!(state.level, 3);
        assert_eq!(state.xp_into_level, 50);
        assert_eq!(state.xp_required_for_level, 225);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(GeometricPolicy::new(0, 1.5, 10, &["A"]).is_err());
        assert!(GeometricPolicy::new(100, 0.5, 10, &["A"]).is_err());
        assert!(GeometricPolicy::new(100, f64::NAN, 10, &["A"]).is_err());
        assert!(GeometricPolicy::new(100, 1.5, 0, &["A"]).is_err());
        assert!(GeometricPolicy::new(100, 1.5, 10, &[]).is_err());
    }

    #[test]
    fn test_flat_multiplier_gives_linear_table() {
        let flat = GeometricPolicy::new(50, 1.0, 4, &["Step"])
            .unwrap_or_else(|e| panic!("flat table rejected: {e}"));
        let thresholds: Vec<u64> = flat.tiers().iter().map(|t| t.threshold).collect();
        assert_eq!(thresholds, vec![0, 50, 100, 150]);
    }
}
