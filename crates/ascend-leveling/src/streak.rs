// ABOUTME: Daily streak arithmetic for consecutive-day login tracking
// ABOUTME: Pure date comparisons; callers supply "today" so tests need no clock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use ascend_core::constants::streaks::STREAK_BONUS_INTERVAL_DAYS;
use chrono::NaiveDate;

/// Compute the streak after activity on `today`.
///
/// Returns `None` when nothing changes: a second login on the same day, or
/// a `today` earlier than the last recorded day (clock skew).
#[must_use]
pub fn advance_streak(
    current_streak: u32,
    last_active_on: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<u32> {
    let Some(last) = last_active_on else {
        return Some(1);
    };
    if today <= last {
        return None;
    }
    if last.succ_opt() == Some(today) {
        Some(current_streak.saturating_add(1).max(1))
    } else {
        Some(1)
    }
}

/// Whether reaching `streak_days` earns the streak milestone bonus
#[must_use]
pub const fn earns_streak_bonus(streak_days: u32) -> bool {
    streak_days > 0 && streak_days % STREAK_BONUS_INTERVAL_DAYS == 0
}
