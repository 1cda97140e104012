// ABOUTME: Integration tests for the per-process session registry
// ABOUTME: Verifies single ownership under concurrent access and draining on session end
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use ascend::progression::SessionRegistry;
use common::TestStores;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_access_starts_one_engine() {
    let stores = TestStores::empty();
    let registry = Arc::new(SessionRegistry::new(stores.deps()));
    let user = Uuid::new_v4();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.get_or_start(user).await })
        })
        .collect();
    let mut engines = Vec::new();
    for task in tasks {
        engines.push(task.await.unwrap());
    }

    assert!(engines.iter().all(|engine| Arc::ptr_eq(engine, &engines[0])));
    assert_eq!(registry.active_sessions(), 1);
}

#[tokio::test]
async fn test_awards_through_registry_share_state() {
    let stores = TestStores::empty();
    let registry = SessionRegistry::new(stores.deps());
    let user = Uuid::new_v4();

    registry.get_or_start(user).await.award_xp(40, None).await.unwrap();
    registry.get_or_start(user).await.award_xp(70, None).await.unwrap();

    let engine = registry.get(user).unwrap();
    assert_eq!(engine.current_xp(), 110);
    assert_eq!(engine.user_id(), user);
    assert!(registry.get(Uuid::new_v4()).is_none());
}

#[tokio::test]
async fn test_end_session_drains_and_removes() {
    let stores = TestStores::empty();
    let registry = SessionRegistry::new(stores.deps());
    let user = Uuid::new_v4();

    registry.get_or_start(user).await.award_xp(150, None).await.unwrap();
    assert!(registry.end_session(user).await);
    assert!(!registry.end_session(user).await);
    assert_eq!(registry.active_sessions(), 0);
    assert_eq!(stores.profile_store.snapshot(user).await.unwrap().xp, 150);

    let resumed = registry.get_or_start(user).await;
    assert_eq!(resumed.current_xp(), 150);
    assert_eq!(resumed.state().level, 2);
}

#[tokio::test]
async fn test_shutdown_all_ends_every_session() {
    let stores = TestStores::empty();
    let registry = SessionRegistry::new(stores.deps());
    let users: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

    for (i, user) in users.iter().enumerate() {
        let amount = 10 * (i64::try_from(i).unwrap() + 1);
        registry.get_or_start(*user).await.award_xp(amount, None).await.unwrap();
    }
    assert_eq!(registry.active_sessions(), 3);

    registry.shutdown_all().await;
    assert_eq!(registry.active_sessions(), 0);
    for (i, user) in users.iter().enumerate() {
        let expected = 10 * (i as u64 + 1);
        assert_eq!(stores.profile_store.snapshot(*user).await.unwrap().xp, expected);
    }
}
