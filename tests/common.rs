// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides logging, in-memory stores, small level tables and fast retry settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `ascend`

use ascend::models::LevelTier;
use ascend::progression::{EngineDeps, NotificationTiming};
use ascend::retry::RetryPolicy;
use ascend::storage::{InMemoryHistory, InMemoryLocalCache, InMemoryProfileStore};
use ascend::TieredPolicy;
use std::sync::{Arc, Once};
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Three-tier table used by the level-up scenarios: 0, 100, 300
pub fn small_policy() -> Arc<TieredPolicy> {
    Arc::new(
        TieredPolicy::new(vec![
            LevelTier::new(1, "Novice", 0),
            LevelTier::new(2, "Apprentice", 100),
            LevelTier::new(3, "Habit Builder", 300),
        ])
        .unwrap(),
    )
}

/// Retry settings that finish in a few milliseconds
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        attempt_timeout: Duration::from_secs(1),
        jitter: false,
    }
}

/// Handles to the in-memory collaborators behind a test engine
pub struct TestStores {
    pub profile_store: Arc<InMemoryProfileStore>,
    pub local_cache: Arc<InMemoryLocalCache>,
    pub history: Arc<InMemoryHistory>,
}

impl TestStores {
    pub fn new(profile_store: InMemoryProfileStore, local_cache: InMemoryLocalCache) -> Self {
        Self {
            profile_store: Arc::new(profile_store),
            local_cache: Arc::new(local_cache),
            history: Arc::new(InMemoryHistory::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(InMemoryProfileStore::new(), InMemoryLocalCache::new())
    }

    /// Engine dependencies over these stores with the three-tier table
    pub fn deps(&self) -> EngineDeps {
        init_test_logging();
        EngineDeps::new(self.profile_store.clone(), self.local_cache.clone())
            .with_policy(small_policy())
            .with_history(self.history.clone())
            .with_retry(fast_retry())
    }

    /// Same as [`Self::deps`] with custom overlay lifetimes
    pub fn deps_with_timing(&self, timing: NotificationTiming) -> EngineDeps {
        self.deps().with_timing(timing)
    }
}
