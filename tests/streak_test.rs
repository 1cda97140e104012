// ABOUTME: Integration tests for daily login streaks and the streak milestone bonus
// ABOUTME: Drives the engine with explicit dates so no test depends on the wall clock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use ascend::constants::xp_rules::{DAILY_LOGIN_XP, DAILY_STREAK_BONUS_XP};
use ascend::errors::ProgressionError;
use ascend::models::XpActivity;
use ascend::progression::{ProgressionEngine, ProgressionEvent};
use ascend::{advance_streak, earns_streak_bonus};
use chrono::NaiveDate;
use ascend::storage::{InMemoryLocalCache, InMemoryProfileStore, ProfileStore};
use common::TestStores;
use uuid::Uuid;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

#[test]
fn test_advance_streak_rules() {
    assert_eq!(advance_streak(0, None, day(1)), Some(1));
    assert_eq!(advance_streak(4, Some(day(1)), day(2)), Some(5));
    assert_eq!(advance_streak(4, Some(day(2)), day(2)), None);
    assert_eq!(advance_streak(4, Some(day(2)), day(5)), Some(1));
    assert_eq!(advance_streak(4, Some(day(5)), day(3)), None);
}

#[test]
fn test_bonus_every_seventh_day() {
    let bonus_days: Vec<u32> = (0..=21).filter(|d| earns_streak_bonus(*d)).collect();
    assert_eq!(bonus_days, vec![7, 14, 21]);
}

#[tokio::test]
async fn test_consecutive_logins_build_streak() {
    let stores = TestStores::empty();
    let engine = ProgressionEngine::start(Uuid::new_v4(), stores.deps()).await;

    for (offset, expected) in (1..=3).zip(1..=3) {
        let outcome = engine.record_daily_login(day(offset)).await.unwrap().unwrap();
        assert_eq!(outcome.streak_days, expected);
        assert_eq!(outcome.login.new_state.current_xp, DAILY_LOGIN_XP * u64::from(expected));
        assert!(outcome.bonus.is_none());
    }
    assert_eq!(engine.streak().await, (3, Some(day(3))));
}

#[tokio::test]
async fn test_same_day_login_is_ignored() {
    let stores = TestStores::empty();
    let engine = ProgressionEngine::start(Uuid::new_v4(), stores.deps()).await;

    assert!(engine.record_daily_login(day(10)).await.unwrap().is_some());
    assert!(engine.record_daily_login(day(10)).await.unwrap().is_none());
    assert_eq!(engine.current_xp(), DAILY_LOGIN_XP);
    assert_eq!(engine.streak().await.0, 1);
}

#[tokio::test]
async fn test_gap_resets_streak() {
    let stores = TestStores::empty();
    let engine = ProgressionEngine::start(Uuid::new_v4(), stores.deps()).await;

    engine.record_daily_login(day(1)).await.unwrap();
    engine.record_daily_login(day(2)).await.unwrap();
    let outcome = engine.record_daily_login(day(5)).await.unwrap().unwrap();
    assert_eq!(outcome.streak_days, 1);
}

#[tokio::test]
async fn test_seventh_day_awards_bonus() {
    let stores = TestStores::empty();
    let engine = ProgressionEngine::start(Uuid::new_v4(), stores.deps()).await;
    let mut events = engine.subscribe_events();

    for d in 1..=6 {
        engine.record_daily_login(day(d)).await.unwrap();
    }
    let outcome = engine.record_daily_login(day(7)).await.unwrap().unwrap();

    assert_eq!(outcome.streak_days, 7);
    let bonus = outcome.bonus.as_ref().unwrap();
    assert_eq!(
        bonus.new_state.current_xp,
        DAILY_LOGIN_XP * 7 + DAILY_STREAK_BONUS_XP
    );
    assert_eq!(outcome.final_state().current_xp, engine.current_xp());

    let mut reasons = Vec::new();
    let mut last_streak = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            ProgressionEvent::XpEarned { reason, .. } => reasons.push(reason),
            ProgressionEvent::StreakUpdated { streak_days } => last_streak = streak_days,
            _ => {}
        }
    }
    assert_eq!(last_streak, 7);
    assert_eq!(reasons.last(), Some(&Some(XpActivity::DailyStreakBonus)));
}

#[tokio::test]
async fn test_streak_is_persisted_and_restored() {
    let user = Uuid::new_v4();
    let stores = TestStores::empty();
    let engine = ProgressionEngine::start(user, stores.deps()).await;

    engine.record_daily_login(day(1)).await.unwrap();
    engine.record_daily_login(day(2)).await.unwrap();
    engine.shutdown().await;

    let profile = stores.profile_store.snapshot(user).await.unwrap();
    assert_eq!(profile.streak_days, 2);
    assert_eq!(profile.last_active_on, Some(day(2)));

    let restarted = ProgressionEngine::start(user, stores.deps()).await;
    let outcome = restarted.record_daily_login(day(3)).await.unwrap().unwrap();
    assert_eq!(outcome.streak_days, 3);
}

#[tokio::test]
async fn test_login_rejected_whole_when_bonus_would_overflow() {
    let user = Uuid::new_v4();
    let near_max = u64::MAX - DAILY_LOGIN_XP;
    let stores = TestStores::new(
        InMemoryProfileStore::with_profile(user, near_max, 3),
        InMemoryLocalCache::with_xp(user, near_max),
    );
    stores.profile_store.save_streak(user, 6, day(6)).await.unwrap();
    let engine = ProgressionEngine::start(user, stores.deps()).await;

    let err = engine.record_daily_login(day(7)).await.unwrap_err();
    assert!(matches!(err, ProgressionError::InvalidAmount { .. }));
    assert_eq!(engine.current_xp(), near_max);
    assert_eq!(engine.streak().await, (6, Some(day(6))));
}
