// ABOUTME: XP rule table mapping each activity kind to a fixed award
// ABOUTME: Hard-coded amounts; awards outside this table go through the raw amount API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

/// Completing a daily habit
pub const HABIT_COMPLETE_XP: u64 = 10;

/// Completing a workout session
pub const WORKOUT_COMPLETE_XP: u64 = 50;

/// First app open of the day
pub const DAILY_LOGIN_XP: u64 = 5;

/// Reaching a streak milestone
pub const DAILY_STREAK_BONUS_XP: u64 = 25;

/// Unlocking an achievement
pub const ACHIEVEMENT_UNLOCK_XP: u64 = 100;
