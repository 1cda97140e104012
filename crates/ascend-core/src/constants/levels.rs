// ABOUTME: Level table and geometric leveling defaults
// ABOUTME: Thresholds are cumulative XP totals, ascending, starting at zero
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

/// Standard ten-tier table as `(level, title, threshold)`
pub const STANDARD_LEVELS: [(u32, &str, u64); 10] = [
    (1, "Novice", 0),
    (2, "Apprentice", 100),
    (3, "Habit Builder", 300),
    (4, "Consistent", 600),
    (5, "Achiever", 1_000),
    (6, "Wellness Warrior", 1_500),
    (7, "Master", 2_200),
    (8, "Grandmaster", 3_000),
    (9, "Legend", 4_000),
    (10, "Zenith", 5_500),
];

/// Max-tier extrapolation: the synthetic next threshold is 1.5x the current total.
/// Expressed as `xp + xp / MAX_TIER_EXTRAPOLATION_DIVISOR` to stay in integers.
pub const MAX_TIER_EXTRAPOLATION_DIVISOR: u64 = 2;

/// XP needed to reach level 2 under the geometric policy
pub const DEFAULT_GEOMETRIC_BASE_XP: u64 = 100;

/// Growth factor applied to each successive level increment
pub const DEFAULT_GEOMETRIC_MULTIPLIER: f64 = 1.5;

/// Highest level generated by the geometric policy
pub const DEFAULT_GEOMETRIC_MAX_LEVEL: u32 = 50;
