// ABOUTME: Per-user progression engine owning the XP total and the award transaction
// ABOUTME: Reconciles cache and store at start, serializes awards, publishes state and notifications
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use super::notifications::{
    NotificationHub, NotificationOverlay, NotificationTiming, ProgressionEvent, Subscription,
};
use super::persister::{DeadLetter, DurablePersister};
use crate::config::environment::ProgressionConfig;
use crate::errors::{AppError, AppResult, ProgressionError};
use crate::logging::ProgressionLogger;
use crate::models::{
    AwardOutcome, DailyLoginOutcome, ProgressionState, XpActivity, XpAwardEvent,
};
use crate::retry::RetryPolicy;
use crate::storage::{FileLocalCache, LocalCache, ProfileStore, SqliteStore, XpHistorySink};
use ascend_leveling::{advance_streak, earns_streak_bonus, LevelingPolicy, TieredPolicy};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Collaborators shared by every engine in a process
#[derive(Clone)]
pub struct EngineDeps {
    /// Leveling curve
    pub policy: Arc<dyn LevelingPolicy>,
    /// Durable profile store
    pub profile_store: Arc<dyn ProfileStore>,
    /// Device-local XP mirror
    pub local_cache: Arc<dyn LocalCache>,
    /// Optional award ledger
    pub history: Option<Arc<dyn XpHistorySink>>,
    /// Durable-write retry settings
    pub retry: RetryPolicy,
    /// Overlay lifetimes
    pub timing: NotificationTiming,
}

impl fmt::Debug for EngineDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineDeps")
            .field("policy", &self.policy.name())
            .field("profile_store", &self.profile_store.name())
            .field("history", &self.history.is_some())
            .field("retry", &self.retry)
            .field("timing", &self.timing)
            .finish()
    }
}

impl EngineDeps {
    /// Standard tiered policy, default retry and timing, no history
    #[must_use]
    pub fn new(profile_store: Arc<dyn ProfileStore>, local_cache: Arc<dyn LocalCache>) -> Self {
        Self {
            policy: Arc::new(TieredPolicy::standard()),
            profile_store,
            local_cache,
            history: None,
            retry: RetryPolicy::default(),
            timing: NotificationTiming::default(),
        }
    }

    /// Use a different leveling curve
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn LevelingPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Record awards in a history ledger
    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn XpHistorySink>) -> Self {
        self.history = Some(history);
        self
    }

    /// Override durable-write retry settings
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override overlay lifetimes
    #[must_use]
    pub const fn with_timing(mut self, timing: NotificationTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Build `SQLite` and file-cache backed dependencies from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the database or cache cannot be opened, or the
    /// configured leveling policy is invalid
    pub async fn from_config(config: &ProgressionConfig) -> AppResult<Self> {
        let store = Arc::new(SqliteStore::connect(&config.database_url).await?);
        let cache = Arc::new(FileLocalCache::open(config.cache_file()).await?);
        let mut deps = Self::new(store.clone(), cache)
            .with_policy(config.build_policy()?)
            .with_retry(config.persistence.retry_policy());
        if config.history_enabled {
            deps = deps.with_history(store);
        }
        Ok(deps)
    }
}

/// Starting total chosen from the two persisted copies
///
/// The larger value wins: the local cache may hold awards whose durable
/// write never landed, and the store may hold awards made on another device.
#[must_use]
pub fn reconcile_starting_xp(local: Option<u64>, durable: Option<u64>) -> u64 {
    local.unwrap_or(0).max(durable.unwrap_or(0))
}

/// Run a startup read, treating a stall past `limit` as a store error
async fn bounded<T>(
    limit: Duration,
    operation: &str,
    read: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    timeout(limit, read)
        .await
        .unwrap_or_else(|_| Err(AppError::store_timeout(operation, limit.as_millis())))
}

#[derive(Debug)]
struct LedgerState {
    xp: u64,
    streak_days: u32,
    last_active_on: Option<NaiveDate>,
}

/// Owner of one user's XP total for the duration of a session
pub struct ProgressionEngine {
    user_id: Uuid,
    policy: Arc<dyn LevelingPolicy>,
    local_cache: Arc<dyn LocalCache>,
    history: Option<Arc<dyn XpHistorySink>>,
    ledger: Mutex<LedgerState>,
    hub: Arc<NotificationHub>,
    persister: DurablePersister,
}

impl fmt::Debug for ProgressionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressionEngine")
            .field("user_id", &self.user_id)
            .field("policy", &self.policy.name())
            .field("state", &self.hub.current_state())
            .finish_non_exhaustive()
    }
}

impl ProgressionEngine {
    /// Start a session: reconcile the starting total and spawn the persister
    ///
    /// Never fails. An unreachable store or cache, or one that does not
    /// answer within the retry policy's attempt timeout, is logged and the
    /// other copy (or zero) is used.
    pub async fn start(user_id: Uuid, deps: EngineDeps) -> Arc<Self> {
        let bound = deps.retry.attempt_timeout;
        let local_xp = match bounded(bound, "get_xp", deps.local_cache.get_xp(user_id)).await {
            Ok(xp) => xp,
            Err(e) => {
                ProgressionLogger::log_store_failure(user_id, "local_cache", "get_xp", &e);
                None
            }
        };
        let (durable, durable_reachable) =
            match bounded(bound, "load", deps.profile_store.load(user_id)).await {
                Ok(profile) => (profile, true),
                Err(e) => {
                    ProgressionLogger::log_store_failure(
                        user_id,
                        deps.profile_store.name(),
                        "load",
                        &e,
                    );
                    (None, false)
                }
            };
        let durable_xp = durable.as_ref().map(|profile| profile.xp);
        let starting_xp = reconcile_starting_xp(local_xp, durable_xp);

        if let (Some(local), Some(stored)) = (local_xp, durable_xp) {
            if local != stored {
                ProgressionLogger::log_stale_reconciliation(user_id, local, stored);
            }
        }

        let persister = DurablePersister::spawn(
            user_id,
            Arc::clone(&deps.profile_store),
            deps.history.clone(),
            deps.retry,
        );

        // Heal whichever copy is behind
        if local_xp.unwrap_or(0) < starting_xp {
            if let Err(e) = deps.local_cache.set_xp(user_id, starting_xp).await {
                ProgressionLogger::log_store_failure(user_id, "local_cache", "set_xp", &e);
            }
        }
        let durable_behind = if durable_reachable {
            durable_xp.unwrap_or(0) < starting_xp
        } else {
            starting_xp > 0
        };
        if durable_behind {
            persister.enqueue_progress(starting_xp, deps.policy.level_for(starting_xp));
        }

        let initial_state = deps.policy.resolve(starting_xp);
        info!(
            user.id = %user_id,
            xp.total = starting_xp,
            level = initial_state.level,
            policy = deps.policy.name(),
            "Progression session started"
        );

        Arc::new(Self {
            user_id,
            hub: NotificationHub::new(initial_state, deps.timing),
            policy: deps.policy,
            local_cache: deps.local_cache,
            history: deps.history,
            ledger: Mutex::new(LedgerState {
                xp: starting_xp,
                streak_days: durable.as_ref().map_or(0, |profile| profile.streak_days),
                last_active_on: durable.and_then(|profile| profile.last_active_on),
            }),
            persister,
        })
    }

    /// User this engine belongs to
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Name of the leveling curve in use
    #[must_use]
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Add XP and run the award transaction
    ///
    /// The local cache is written and state and notifications are published
    /// before this returns. The durable write happens in the background.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::InvalidAmount` if `amount` is not positive
    /// or would overflow the total; nothing changes in that case
    pub async fn award_xp(
        &self,
        amount: i64,
        reason: Option<XpActivity>,
    ) -> Result<AwardOutcome, ProgressionError> {
        let amount = u64::try_from(amount)
            .ok()
            .filter(|value| *value > 0)
            .ok_or(ProgressionError::InvalidAmount { value: amount })?;
        let mut ledger = self.ledger.lock().await;
        self.apply_award(&mut ledger, amount, reason).await
    }

    /// Award the fixed amount of a rule-table activity
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::InvalidAmount` if the total would overflow
    pub async fn award_activity(
        &self,
        activity: XpActivity,
    ) -> Result<AwardOutcome, ProgressionError> {
        let mut ledger = self.ledger.lock().await;
        self.apply_award(&mut ledger, activity.xp_reward(), Some(activity))
            .await
    }

    /// Record the first app open of `today`
    ///
    /// Advances the streak, awards `DailyLogin`, and on every streak milestone
    /// also awards `DailyStreakBonus`. Returns `None` when `today` was already
    /// recorded.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::InvalidAmount` if the total would overflow
    pub async fn record_daily_login(
        &self,
        today: NaiveDate,
    ) -> Result<Option<DailyLoginOutcome>, ProgressionError> {
        let mut ledger = self.ledger.lock().await;
        let Some(streak_days) = advance_streak(ledger.streak_days, ledger.last_active_on, today)
        else {
            debug!(user.id = %self.user_id, %today, "Daily login already recorded");
            return Ok(None);
        };

        let bonus_xp = if earns_streak_bonus(streak_days) {
            XpActivity::DailyStreakBonus.xp_reward()
        } else {
            0
        };
        // Both awards land or neither does
        let combined = XpActivity::DailyLogin.xp_reward().saturating_add(bonus_xp);
        if ledger.xp.checked_add(combined).is_none() {
            return Err(ProgressionError::InvalidAmount {
                value: i64::try_from(combined).unwrap_or(i64::MAX),
            });
        }

        let login = self
            .apply_award(
                &mut ledger,
                XpActivity::DailyLogin.xp_reward(),
                Some(XpActivity::DailyLogin),
            )
            .await?;
        let bonus = if bonus_xp > 0 {
            Some(
                self.apply_award(
                    &mut ledger,
                    XpActivity::DailyStreakBonus.xp_reward(),
                    Some(XpActivity::DailyStreakBonus),
                )
                .await?,
            )
        } else {
            None
        };

        ledger.streak_days = streak_days;
        ledger.last_active_on = Some(today);
        drop(ledger);

        self.persister.enqueue_streak(streak_days, today);
        self.hub.publish_streak(streak_days);
        info!(user.id = %self.user_id, streak.days = streak_days, "Daily login recorded");

        Ok(Some(DailyLoginOutcome {
            streak_days,
            login,
            bonus,
        }))
    }

    async fn apply_award(
        &self,
        ledger: &mut LedgerState,
        amount: u64,
        reason: Option<XpActivity>,
    ) -> Result<AwardOutcome, ProgressionError> {
        let new_xp = ledger
            .xp
            .checked_add(amount)
            .ok_or(ProgressionError::InvalidAmount {
                value: i64::try_from(amount).unwrap_or(i64::MAX),
            })?;
        let previous_level = self.policy.level_for(ledger.xp);
        let new_state = self.policy.resolve(new_xp);
        let outcome = AwardOutcome {
            leveled_up: new_state.level > previous_level,
            previous_level,
            new_state,
        };
        ledger.xp = new_xp;

        if let Err(e) = self.local_cache.set_xp(self.user_id, new_xp).await {
            ProgressionLogger::log_store_failure(self.user_id, "local_cache", "set_xp", &e);
        }

        self.hub.publish_award(amount, reason, &outcome);
        self.persister
            .enqueue_progress(new_xp, outcome.new_state.level);
        if self.history.is_some() {
            self.persister
                .enqueue_history(XpAwardEvent::new(self.user_id, amount, reason, new_xp));
        }

        ProgressionLogger::log_award(self.user_id, amount, reason, &outcome);
        Ok(outcome)
    }

    /// Latest published state; never waits on I/O
    #[must_use]
    pub fn state(&self) -> ProgressionState {
        self.hub.current_state()
    }

    /// Current cumulative total
    #[must_use]
    pub fn current_xp(&self) -> u64 {
        self.hub.current_state().current_xp
    }

    /// Consecutive active days and the last recorded day
    pub async fn streak(&self) -> (u32, Option<NaiveDate>) {
        let ledger = self.ledger.lock().await;
        (ledger.streak_days, ledger.last_active_on)
    }

    /// Sum of awards since midnight UTC of `now`'s day
    ///
    /// Waits for queued history writes first.
    ///
    /// # Errors
    ///
    /// Returns a config error when history is disabled, or the ledger's
    /// query error
    pub async fn xp_today(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let history = self.history_sink()?;
        self.persister.flush().await;
        let midnight = Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::default()));
        history.xp_since(self.user_id, midnight).await
    }

    /// Most recent awards, newest first
    ///
    /// # Errors
    ///
    /// Returns a config error when history is disabled, or the ledger's
    /// query error
    pub async fn recent_history(&self, limit: u32) -> AppResult<Vec<XpAwardEvent>> {
        let history = self.history_sink()?;
        self.persister.flush().await;
        history.recent(self.user_id, limit).await
    }

    fn history_sink(&self) -> AppResult<&Arc<dyn XpHistorySink>> {
        self.history
            .as_ref()
            .ok_or_else(|| AppError::config("XP history is disabled").with_user_id(self.user_id))
    }

    /// Receiver that always holds the latest state
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ProgressionState> {
        self.hub.subscribe_state()
    }

    /// Receiver for every progression event from now on
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<ProgressionEvent> {
        self.hub.subscribe_events()
    }

    /// Receiver that always holds the visible overlays
    #[must_use]
    pub fn subscribe_overlay(&self) -> watch::Receiver<NotificationOverlay> {
        self.hub.subscribe_overlay()
    }

    /// Register a synchronous event callback
    pub fn subscribe_fn<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ProgressionEvent) + Send + Sync + 'static,
    {
        self.hub.subscribe_fn(callback)
    }

    /// Overlays currently visible
    #[must_use]
    pub fn overlay(&self) -> NotificationOverlay {
        self.hub.current_overlay()
    }

    /// Hide the level-up celebration; `false` if none was showing
    pub fn dismiss_level_up(&self) -> bool {
        self.hub.dismiss_level_up()
    }

    /// Durable writes abandoned after retries
    #[must_use]
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.persister.dead_letters()
    }

    /// Wait for queued durable writes to be attempted
    pub async fn flush(&self) {
        self.persister.flush().await;
    }

    /// Stop accepting durable writes and drain the queue
    ///
    /// Awards after shutdown still update the in-memory state and local
    /// cache; their durable writes go straight to the dead-letter list.
    pub async fn shutdown(&self) {
        self.persister.shutdown().await;
        if !self.persister.dead_letters().is_empty() {
            warn!(
                user.id = %self.user_id,
                dead_letters = self.persister.dead_letters().len(),
                "Session ended with abandoned durable writes"
            );
        }
        info!(user.id = %self.user_id, xp.total = self.current_xp(), "Progression session ended");
    }
}
