// ABOUTME: End-to-end tests for the ascend-cli binary against on-disk stores
// ABOUTME: Checks that durable writes are drained whether a command succeeds or fails
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use ascend::config::environment::DatabaseUrl;
use ascend::constants::env_config;
use ascend::storage::{FileLocalCache, LocalCache, ProfileStore, SqliteStore};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;
use uuid::Uuid;

async fn seed(dir: &Path, user: Uuid, durable_xp: u64, cached_xp: u64) -> DatabaseUrl {
    let url = DatabaseUrl::SQLite {
        path: dir.join("ascend.db"),
    };
    let store = SqliteStore::connect(&url).await.unwrap();
    store.save_progress(user, durable_xp, 1).await.unwrap();
    store.pool().close().await;

    let cache = FileLocalCache::open(dir.join("xp_cache.json")).await.unwrap();
    cache.set_xp(user, cached_xp).await.unwrap();
    url
}

fn run_cli(dir: &Path, url: &DatabaseUrl, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ascend-cli"))
        .args(args)
        .arg("--database-url")
        .arg(url.to_connection_string())
        .env(env_config::CACHE_DIR, dir)
        .env_remove(env_config::DATABASE_URL)
        .env_remove(env_config::LEVELING_POLICY)
        .env(env_config::PERSIST_BASE_DELAY_MS, "1")
        .output()
        .unwrap()
}

async fn durable_xp(url: &DatabaseUrl, user: Uuid) -> u64 {
    let store = SqliteStore::connect(url).await.unwrap();
    let xp = store.load(user).await.unwrap().map_or(0, |profile| profile.xp);
    store.pool().close().await;
    xp
}

#[tokio::test]
async fn test_failed_award_still_heals_stale_store() {
    common::init_test_logging();
    let dir = TempDir::new().unwrap();
    let user = Uuid::new_v4();
    let url = seed(dir.path(), user, 100, 120).await;

    let output = run_cli(dir.path(), &url, &["award", &user.to_string(), "--amount", "0"]);

    assert!(!output.status.success());
    assert_eq!(durable_xp(&url, user).await, 120);
}

#[tokio::test]
async fn test_award_prints_outcome_and_persists() {
    common::init_test_logging();
    let dir = TempDir::new().unwrap();
    let user = Uuid::new_v4();
    let url = seed(dir.path(), user, 100, 100).await;

    let output = run_cli(dir.path(), &url, &["award", &user.to_string(), "--amount", "25"]);

    assert!(output.status.success());
    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome["new_state"]["current_xp"], 125);
    assert_eq!(durable_xp(&url, user).await, 125);
}
