// ABOUTME: In-memory profile store, local cache and history ledger
// ABOUTME: Used for tests and ephemeral sessions; stores can be toggled offline to simulate outages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use super::{LocalCache, ProfileStore, XpHistorySink};
use crate::errors::{AppError, AppResult};
use crate::models::{ProfileXp, XpAwardEvent};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

const PROFILE_STORE_NAME: &str = "memory_profile_store";
const LOCAL_CACHE_NAME: &str = "memory_local_cache";

/// Profile store kept in a `HashMap`
#[derive(Debug)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, ProfileXp>>,
    available: AtomicBool,
    writes: AtomicUsize,
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProfileStore {
    /// Empty, reachable store
    #[must_use]
    pub fn new() -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            writes: AtomicUsize::new(0),
        }
    }

    /// Store pre-seeded with one user's total
    #[must_use]
    pub fn with_profile(user_id: Uuid, xp: u64, level: u32) -> Self {
        let mut profile = ProfileXp::new(user_id);
        profile.xp = xp;
        profile.level = level;
        Self {
            profiles: RwLock::new(HashMap::from([(user_id, profile)])),
            ..Self::new()
        }
    }

    /// Simulate the store going offline or coming back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current record without going through the availability check
    pub async fn snapshot(&self, user_id: Uuid) -> Option<ProfileXp> {
        self.profiles.read().await.get(&user_id).cloned()
    }

    fn check_available(&self) -> AppResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::store_unavailable(PROFILE_STORE_NAME, "store is offline"))
        }
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    fn name(&self) -> &'static str {
        PROFILE_STORE_NAME
    }

    async fn load(&self, user_id: Uuid) -> AppResult<Option<ProfileXp>> {
        self.check_available()?;
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn save_progress(&self, user_id: Uuid, xp: u64, level: u32) -> AppResult<()> {
        self.check_available()?;
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .entry(user_id)
            .or_insert_with(|| ProfileXp::new(user_id));
        if xp >= profile.xp {
            profile.xp = xp;
            profile.level = level;
        }
        profile.updated_at = Utc::now();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn save_streak(
        &self,
        user_id: Uuid,
        streak_days: u32,
        last_active_on: NaiveDate,
    ) -> AppResult<()> {
        self.check_available()?;
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .entry(user_id)
            .or_insert_with(|| ProfileXp::new(user_id));
        profile.streak_days = streak_days;
        profile.last_active_on = Some(last_active_on);
        profile.updated_at = Utc::now();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Local cache kept in a `HashMap`
#[derive(Debug)]
pub struct InMemoryLocalCache {
    totals: RwLock<HashMap<Uuid, u64>>,
    available: AtomicBool,
}

impl Default for InMemoryLocalCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLocalCache {
    /// Empty cache
    #[must_use]
    pub fn new() -> Self {
        Self {
            totals: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Cache pre-seeded with one user's total
    #[must_use]
    pub fn with_xp(user_id: Uuid, xp: u64) -> Self {
        Self {
            totals: RwLock::new(HashMap::from([(user_id, xp)])),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate storage failures
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> AppResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::storage(format!("{LOCAL_CACHE_NAME} is unavailable")))
        }
    }
}

#[async_trait]
impl LocalCache for InMemoryLocalCache {
    async fn get_xp(&self, user_id: Uuid) -> AppResult<Option<u64>> {
        self.check_available()?;
        Ok(self.totals.read().await.get(&user_id).copied())
    }

    async fn set_xp(&self, user_id: Uuid, xp: u64) -> AppResult<()> {
        self.check_available()?;
        self.totals.write().await.insert(user_id, xp);
        Ok(())
    }
}

/// History ledger kept in a `Vec`
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    events: RwLock<Vec<XpAwardEvent>>,
}

impl InMemoryHistory {
    /// Empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded event in insertion order
    pub async fn all(&self) -> Vec<XpAwardEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl XpHistorySink for InMemoryHistory {
    async fn record(&self, event: &XpAwardEvent) -> AppResult<()> {
        let mut events = self.events.write().await;
        if !events.iter().any(|existing| existing.id == event.id) {
            events.push(event.clone());
        }
        Ok(())
    }

    async fn xp_since(&self, user_id: Uuid, since: DateTime<Utc>) -> AppResult<u64> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|event| event.user_id == user_id && event.created_at >= since)
            .fold(0_u64, |sum, event| sum.saturating_add(event.amount)))
    }

    async fn recent(&self, user_id: Uuid, limit: u32) -> AppResult<Vec<XpAwardEvent>> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .rev()
            .filter(|event| event.user_id == user_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// Ledger that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHistory;

#[async_trait]
impl XpHistorySink for NoopHistory {
    async fn record(&self, _event: &XpAwardEvent) -> AppResult<()> {
        Ok(())
    }

    async fn xp_since(&self, _user_id: Uuid, _since: DateTime<Utc>) -> AppResult<u64> {
        Ok(0)
    }

    async fn recent(&self, _user_id: Uuid, _limit: u32) -> AppResult<Vec<XpAwardEvent>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_profile_store_never_lowers_total() {
        let user = Uuid::new_v4();
        let store = InMemoryProfileStore::new();
        store.save_progress(user, 300, 3).await.unwrap();
        store.save_progress(user, 120, 2).await.unwrap();

        let profile = store.load(user).await.unwrap().unwrap();
        assert_eq!(profile.xp, 300);
        assert_eq!(profile.level, 3);
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_offline_store_reports_retryable_error() {
        let store = InMemoryProfileStore::new();
        store.set_available(false);
        let err = store.load(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_history_recent_is_newest_first() {
        let user = Uuid::new_v4();
        let history = InMemoryHistory::new();
        for (amount, total) in [(10, 10), (50, 60), (5, 65)] {
            history
                .record(&XpAwardEvent::new(user, amount, None, total))
                .await
                .unwrap();
        }
        let recent = history.recent(user, 2).await.unwrap();
        assert_eq!(
            recent.iter().map(|e| e.total_after).collect::<Vec<_>>(),
            vec![65, 60]
        );
        assert_eq!(
            history.xp_since(user, DateTime::<Utc>::MIN_UTC).await.unwrap(),
            65
        );
    }
}
