// ABOUTME: Integration tests for the SQLite profile store and XP history ledger
// ABOUTME: Runs against in-memory and on-disk databases created per test
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use ascend::config::environment::DatabaseUrl;
use ascend::models::{XpActivity, XpAwardEvent};
use ascend::progression::{EngineDeps, ProgressionEngine};
use ascend::storage::{InMemoryLocalCache, ProfileStore, SqliteStore, XpHistorySink};
use chrono::{Duration, NaiveDate, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

async fn memory_store() -> SqliteStore {
    common::init_test_logging();
    SqliteStore::connect(&DatabaseUrl::Memory).await.unwrap()
}

#[tokio::test]
async fn test_missing_profile_loads_as_none() {
    let store = memory_store().await;
    assert!(store.load(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_save_progress_never_lowers_total() {
    let store = memory_store().await;
    let user = Uuid::new_v4();

    store.save_progress(user, 300, 3).await.unwrap();
    store.save_progress(user, 120, 2).await.unwrap();
    let profile = store.load(user).await.unwrap().unwrap();
    assert_eq!(profile.xp, 300);
    assert_eq!(profile.level, 3);

    store.save_progress(user, 650, 4).await.unwrap();
    let profile = store.load(user).await.unwrap().unwrap();
    assert_eq!(profile.xp, 650);
    assert_eq!(profile.level, 4);
}

#[tokio::test]
async fn test_streak_and_progress_share_a_row() {
    let store = memory_store().await;
    let user = Uuid::new_v4();
    let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

    store.save_streak(user, 4, today).await.unwrap();
    store.save_progress(user, 90, 1).await.unwrap();

    let profile = store.load(user).await.unwrap().unwrap();
    assert_eq!(profile.xp, 90);
    assert_eq!(profile.streak_days, 4);
    assert_eq!(profile.last_active_on, Some(today));
}

#[tokio::test]
async fn test_list_profiles_orders_by_xp() {
    let store = memory_store().await;
    let (low, high) = (Uuid::new_v4(), Uuid::new_v4());
    store.save_progress(low, 10, 1).await.unwrap();
    store.save_progress(high, 1_200, 5).await.unwrap();

    let profiles = store.list_profiles(10).await.unwrap();
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0].user_id, high);
    assert_eq!(store.list_profiles(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_history_sums_since_and_lists_recent() {
    let store = memory_store().await;
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();
    let now = Utc::now();

    let mut old = XpAwardEvent::new(user, 100, Some(XpActivity::AchievementUnlock), 100);
    old.created_at = now - Duration::days(2);
    let first = XpAwardEvent::new(user, 50, Some(XpActivity::WorkoutComplete), 150);
    let second = XpAwardEvent::new(user, 10, None, 160);
    let foreign = XpAwardEvent::new(other, 25, None, 25);

    for event in [&old, &first, &second, &foreign] {
        store.record(event).await.unwrap();
    }
    // Replays of the same event are ignored
    store.record(&first).await.unwrap();

    assert_eq!(store.xp_since(user, now - Duration::hours(1)).await.unwrap(), 60);
    assert_eq!(store.xp_since(user, now - Duration::days(3)).await.unwrap(), 160);
    assert_eq!(store.xp_since(Uuid::new_v4(), now).await.unwrap(), 0);

    let recent = store.recent(user, 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].total_after, 160);
    assert_eq!(recent[0].reason, None);
    assert_eq!(recent[1].reason, Some(XpActivity::WorkoutComplete));
    assert_eq!(recent[1].id, first.id);
}

#[tokio::test]
async fn test_file_database_survives_reconnect() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("ascend.db");
    let url = DatabaseUrl::SQLite { path: path.clone() };
    let user = Uuid::new_v4();

    {
        let store = SqliteStore::connect(&url).await.unwrap();
        store.save_progress(user, 420, 3).await.unwrap();
        store.pool().close().await;
    }

    let store = SqliteStore::connect(&url).await.unwrap();
    assert!(path.exists());
    assert_eq!(store.load(user).await.unwrap().unwrap().xp, 420);
}

#[tokio::test]
async fn test_engine_over_sqlite_records_history() {
    let store = Arc::new(memory_store().await);
    let user = Uuid::new_v4();
    let deps = EngineDeps::new(store.clone(), Arc::new(InMemoryLocalCache::new()))
        .with_history(store.clone())
        .with_retry(common::fast_retry());
    let engine = ProgressionEngine::start(user, deps).await;

    engine.award_activity(XpActivity::WorkoutComplete).await.unwrap();
    engine.award_activity(XpActivity::HabitComplete).await.unwrap();

    assert_eq!(engine.xp_today(Utc::now()).await.unwrap(), 60);
    engine.shutdown().await;

    let profile = store.load(user).await.unwrap().unwrap();
    assert_eq!(profile.xp, 60);
    assert_eq!(profile.level, 1);
}
