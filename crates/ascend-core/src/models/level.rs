// ABOUTME: Level tier and derived progression state models
// ABOUTME: ProgressionState is recomputed from cumulative XP and never stored on its own
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use serde::{Deserialize, Serialize};

/// One entry of an ordered level table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTier {
    /// Positive level number, strictly increasing across the table
    pub level: u32,
    /// Human-readable rank name
    pub title: String,
    /// Minimum cumulative XP required to attain this tier
    pub threshold: u64,
}

impl LevelTier {
    /// Create a new tier
    pub fn new(level: u32, title: impl Into<String>, threshold: u64) -> Self {
        Self {
            level,
            title: title.into(),
            threshold,
        }
    }
}

/// Progression derived from a cumulative XP total
///
/// `xp_required_for_level` is always positive and `progress_fraction` always
/// lies in `[0, 1]`, including past the last tier where the next threshold
/// is extrapolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionState {
    /// Highest tier whose threshold is at or below `current_xp`
    pub level: u32,
    /// Title of that tier
    pub title: String,
    /// Raw cumulative XP total
    pub current_xp: u64,
    /// Threshold of the next tier (extrapolated past the last tier)
    pub next_level_xp: u64,
    /// XP earned since entering the current tier
    pub xp_into_level: u64,
    /// Width of the current tier in XP
    pub xp_required_for_level: u64,
    /// `xp_into_level / xp_required_for_level`, clamped to `[0, 1]`
    pub progress_fraction: f64,
}

impl ProgressionState {
    /// XP still missing before the next tier
    #[must_use]
    pub const fn xp_to_next_level(&self) -> u64 {
        self.xp_required_for_level.saturating_sub(self.xp_into_level)
    }

    /// Progress as a whole percentage for progress bars
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        (self.progress_fraction * 100.0).round().clamp(0.0, 100.0) as u8
    }
}
