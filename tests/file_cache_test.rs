// ABOUTME: Integration tests for the JSON file-backed local XP cache
// ABOUTME: Verifies persistence across reopen, corrupt-file recovery and engine reconciliation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use ascend::progression::{EngineDeps, ProgressionEngine};
use ascend::storage::{FileLocalCache, InMemoryProfileStore, LocalCache};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

#[tokio::test]
async fn test_missing_file_starts_empty_and_creates_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ascend").join("xp_cache.json");

    let cache = FileLocalCache::open(&path).await.unwrap();
    assert!(path.parent().unwrap().is_dir());
    assert_eq!(cache.get_xp(Uuid::new_v4()).await.unwrap(), None);
    assert_eq!(cache.path(), path.as_path());
}

#[tokio::test]
async fn test_totals_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("xp_cache.json");
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    let cache = FileLocalCache::open(&path).await.unwrap();
    cache.set_xp(alice, 120).await.unwrap();
    cache.set_xp(bob, 45).await.unwrap();
    cache.set_xp(alice, 130).await.unwrap();
    drop(cache);

    let reopened = FileLocalCache::open(&path).await.unwrap();
    assert_eq!(reopened.get_xp(alice).await.unwrap(), Some(130));
    assert_eq!(reopened.get_xp(bob).await.unwrap(), Some(45));

    let raw: BTreeMap<Uuid, u64> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw.len(), 2);
    assert!(!path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn test_corrupt_file_is_replaced_on_next_write() {
    common::init_test_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("xp_cache.json");
    std::fs::write(&path, "{ not json").unwrap();

    let cache = FileLocalCache::open(&path).await.unwrap();
    let user = Uuid::new_v4();
    assert_eq!(cache.get_xp(user).await.unwrap(), None);

    cache.set_xp(user, 15).await.unwrap();
    let reopened = FileLocalCache::open(&path).await.unwrap();
    assert_eq!(reopened.get_xp(user).await.unwrap(), Some(15));
}

#[tokio::test]
async fn test_engine_resumes_from_file_cache() {
    common::init_test_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("xp_cache.json");
    let user = Uuid::new_v4();
    let store = Arc::new(InMemoryProfileStore::new());

    {
        let cache = Arc::new(FileLocalCache::open(&path).await.unwrap());
        let deps = EngineDeps::new(store.clone(), cache).with_retry(common::fast_retry());
        let engine = ProgressionEngine::start(user, deps).await;
        store.set_available(false);
        engine.award_xp(140, None).await.unwrap();
        engine.shutdown().await;
    }

    store.set_available(true);
    let cache = Arc::new(FileLocalCache::open(&path).await.unwrap());
    let deps = EngineDeps::new(store.clone(), cache).with_retry(common::fast_retry());
    let engine = ProgressionEngine::start(user, deps).await;
    assert_eq!(engine.current_xp(), 140);
    assert_eq!(engine.state().title, "Apprentice");

    engine.flush().await;
    assert_eq!(store.snapshot(user).await.unwrap().xp, 140);
}
