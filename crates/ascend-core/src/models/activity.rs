// ABOUTME: Closed set of XP-earning activities with their fixed rewards
// ABOUTME: Serves as the award reason tag recorded in the history ledger
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use crate::constants::xp_rules::{
    ACHIEVEMENT_UNLOCK_XP, DAILY_LOGIN_XP, DAILY_STREAK_BONUS_XP, HABIT_COMPLETE_XP,
    WORKOUT_COMPLETE_XP,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Activity kinds that earn XP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpActivity {
    /// A daily habit was checked off
    HabitComplete,
    /// A workout session was finished
    WorkoutComplete,
    /// First app open of the day
    DailyLogin,
    /// Streak milestone reached
    DailyStreakBonus,
    /// An achievement was unlocked
    AchievementUnlock,
}

impl XpActivity {
    /// Every activity in rule-table order
    pub const ALL: [Self; 5] = [
        Self::HabitComplete,
        Self::WorkoutComplete,
        Self::DailyLogin,
        Self::DailyStreakBonus,
        Self::AchievementUnlock,
    ];

    /// XP awarded for this activity
    #[must_use]
    pub const fn xp_reward(&self) -> u64 {
        match self {
            Self::HabitComplete => HABIT_COMPLETE_XP,
            Self::WorkoutComplete => WORKOUT_COMPLETE_XP,
            Self::DailyLogin => DAILY_LOGIN_XP,
            Self::DailyStreakBonus => DAILY_STREAK_BONUS_XP,
            Self::AchievementUnlock => ACHIEVEMENT_UNLOCK_XP,
        }
    }

    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HabitComplete => "habit_complete",
            Self::WorkoutComplete => "workout_complete",
            Self::DailyLogin => "daily_login",
            Self::DailyStreakBonus => "daily_streak_bonus",
            Self::AchievementUnlock => "achievement_unlock",
        }
    }

    /// Parse from database or CLI string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "habit_complete" | "habit" => Some(Self::HabitComplete),
            "workout_complete" | "workout" => Some(Self::WorkoutComplete),
            "daily_login" | "login" => Some(Self::DailyLogin),
            "daily_streak_bonus" | "streak_bonus" => Some(Self::DailyStreakBonus),
            "achievement_unlock" | "achievement" => Some(Self::AchievementUnlock),
            _ => None,
        }
    }
}

impl fmt::Display for XpActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
