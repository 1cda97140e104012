// ABOUTME: Process-wide map from user id to that user's single progression engine
// ABOUTME: Concurrent first access starts exactly one engine; ending a session drains its persister
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use super::engine::{EngineDeps, ProgressionEngine};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;
use uuid::Uuid;

type EngineSlot = Arc<OnceCell<Arc<ProgressionEngine>>>;

/// One engine per user per process
#[derive(Debug)]
pub struct SessionRegistry {
    deps: EngineDeps,
    sessions: DashMap<Uuid, EngineSlot>,
}

impl SessionRegistry {
    /// Empty registry; every engine it starts shares `deps`
    #[must_use]
    pub fn new(deps: EngineDeps) -> Self {
        Self {
            deps,
            sessions: DashMap::new(),
        }
    }

    /// Engine for `user_id`, starting one if none is running
    pub async fn get_or_start(&self, user_id: Uuid) -> Arc<ProgressionEngine> {
        // Clone the slot out so no shard lock is held across the start
        let slot: EngineSlot = Arc::clone(self.sessions.entry(user_id).or_default().value());
        let engine = slot
            .get_or_init(|| ProgressionEngine::start(user_id, self.deps.clone()))
            .await;
        Arc::clone(engine)
    }

    /// Engine for `user_id` if a session is running
    #[must_use]
    pub fn get(&self, user_id: Uuid) -> Option<Arc<ProgressionEngine>> {
        self.sessions
            .get(&user_id)
            .and_then(|slot| slot.get().cloned())
    }

    /// Number of running sessions
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Remove a session and drain its durable writes
    ///
    /// Returns `false` if no session was running.
    pub async fn end_session(&self, user_id: Uuid) -> bool {
        let Some((_, slot)) = self.sessions.remove(&user_id) else {
            return false;
        };
        if let Some(engine) = slot.get() {
            engine.shutdown().await;
        }
        debug!(user.id = %user_id, "Session removed from registry");
        true
    }

    /// End every running session
    pub async fn shutdown_all(&self) {
        let users: Vec<Uuid> = self.sessions.iter().map(|entry| *entry.key()).collect();
        for user_id in users {
            self.end_session(user_id).await;
        }
    }
}
