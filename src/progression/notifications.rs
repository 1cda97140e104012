// ABOUTME: Fan-out of progression state, transient events and on-screen overlays
// ABOUTME: watch channels for latest values, broadcast for events, timed auto-expiry of toasts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

//! Notification hub
//!
//! Every engine owns one hub. Subscribers pick the shape they need:
//!
//! - `watch` receivers always hold the latest [`ProgressionState`] and
//!   [`NotificationOverlay`]; late subscribers see the current value at once
//! - a `broadcast` receiver yields every [`ProgressionEvent`] in order
//! - synchronous callbacks registered with [`NotificationHub::subscribe_fn`]
//!   run inline on the publishing task until their [`Subscription`] drops
//!
//! Senders never fail when nobody is listening.

use crate::constants::notifications::{
    EVENT_CHANNEL_CAPACITY, LEVEL_UP_DURATION_MS, XP_TOAST_DURATION_MS,
};
use crate::models::{AwardOutcome, ProgressionState, XpActivity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::sleep;
use tracing::trace;

/// Transient progression events for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressionEvent {
    /// XP was added; drives the "+N XP" toast
    XpEarned {
        /// Amount awarded
        amount: u64,
        /// Activity that earned it, if any
        reason: Option<XpActivity>,
        /// Total after the award
        total_xp: u64,
    },
    /// The XP toast timed out
    XpToastExpired,
    /// An award crossed at least one tier threshold
    LevelUp {
        /// Level before the award
        previous_level: u32,
        /// Level after the award
        new_level: u32,
        /// Title of the new level
        title: String,
    },
    /// The level-up celebration was dismissed by the user
    LevelUpDismissed,
    /// The level-up celebration timed out
    LevelUpExpired,
    /// The daily login streak changed
    StreakUpdated {
        /// Consecutive active days
        streak_days: u32,
    },
}

/// Level-up celebration contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpNotice {
    /// Level reached
    pub level: u32,
    /// Title of that level
    pub title: String,
}

/// What is currently on screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOverlay {
    /// Amount shown in the XP toast
    pub xp_toast: Option<u64>,
    /// Level-up celebration
    pub level_up: Option<LevelUpNotice>,
}

/// How long each overlay stays visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTiming {
    /// XP toast lifetime
    pub xp_toast: Duration,
    /// Level-up celebration lifetime when not dismissed
    pub level_up: Duration,
}

impl Default for NotificationTiming {
    fn default() -> Self {
        Self {
            xp_toast: Duration::from_millis(XP_TOAST_DURATION_MS),
            level_up: Duration::from_millis(LEVEL_UP_DURATION_MS),
        }
    }
}

type Listener = Arc<dyn Fn(&ProgressionEvent) + Send + Sync>;
type ListenerMap = Mutex<BTreeMap<u64, Listener>>;

/// Guard for a callback registered with [`NotificationHub::subscribe_fn`]
///
/// The callback is removed when the guard drops. A drop on another thread
/// that races an in-flight emit can still see that one event delivered;
/// no later event reaches the callback.
#[must_use = "the callback is unregistered as soon as the Subscription is dropped"]
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerMap>,
}

impl Subscription {
    /// Unregister now
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id);
        }
    }
}

/// State, overlay and event fan-out for one engine
pub struct NotificationHub {
    state_tx: watch::Sender<ProgressionState>,
    overlay_tx: watch::Sender<NotificationOverlay>,
    events_tx: broadcast::Sender<ProgressionEvent>,
    listeners: Arc<ListenerMap>,
    next_listener_id: AtomicU64,
    toast_generation: AtomicU64,
    level_up_generation: AtomicU64,
    timing: NotificationTiming,
}

impl fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationHub")
            .field("state", &*self.state_tx.borrow())
            .field("overlay", &*self.overlay_tx.borrow())
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

impl NotificationHub {
    /// Create a hub seeded with the session's starting state
    #[must_use]
    pub fn new(initial: ProgressionState, timing: NotificationTiming) -> Arc<Self> {
        let (state_tx, _) = watch::channel(initial);
        let (overlay_tx, _) = watch::channel(NotificationOverlay::default());
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            state_tx,
            overlay_tx,
            events_tx,
            listeners: Arc::new(Mutex::new(BTreeMap::new())),
            next_listener_id: AtomicU64::new(0),
            toast_generation: AtomicU64::new(0),
            level_up_generation: AtomicU64::new(0),
            timing,
        })
    }

    /// Latest published state
    #[must_use]
    pub fn current_state(&self) -> ProgressionState {
        self.state_tx.borrow().clone()
    }

    /// Overlays currently visible
    #[must_use]
    pub fn current_overlay(&self) -> NotificationOverlay {
        self.overlay_tx.borrow().clone()
    }

    /// Receiver that always holds the latest state
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ProgressionState> {
        self.state_tx.subscribe()
    }

    /// Receiver that always holds the visible overlays
    #[must_use]
    pub fn subscribe_overlay(&self) -> watch::Receiver<NotificationOverlay> {
        self.overlay_tx.subscribe()
    }

    /// Receiver for every event published from now on
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<ProgressionEvent> {
        self.events_tx.subscribe()
    }

    /// Register a synchronous callback for every event
    ///
    /// Callbacks run on the publishing task and must not block.
    pub fn subscribe_fn<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ProgressionEvent) + Send + Sync + 'static,
    {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(callback));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Number of registered callbacks
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Replace the current state
    pub fn publish_state(&self, state: ProgressionState) {
        self.state_tx.send_replace(state);
    }

    /// Publish the state change and notifications of a completed award
    pub fn publish_award(
        self: &Arc<Self>,
        amount: u64,
        reason: Option<XpActivity>,
        outcome: &AwardOutcome,
    ) {
        self.publish_state(outcome.new_state.clone());
        self.show_xp_toast(amount, reason, outcome.new_state.current_xp);
        if outcome.leveled_up {
            self.show_level_up(outcome);
        }
    }

    /// Publish a streak change
    pub fn publish_streak(&self, streak_days: u32) {
        self.emit(ProgressionEvent::StreakUpdated { streak_days });
    }

    /// Hide the level-up celebration
    ///
    /// Returns `false` if none was showing.
    pub fn dismiss_level_up(&self) -> bool {
        let dismissed = self.overlay_tx.send_if_modified(|overlay| {
            self.level_up_generation.fetch_add(1, Ordering::SeqCst);
            overlay.level_up.take().is_some()
        });
        if dismissed {
            self.emit(ProgressionEvent::LevelUpDismissed);
        }
        dismissed
    }

    fn show_xp_toast(self: &Arc<Self>, amount: u64, reason: Option<XpActivity>, total_xp: u64) {
        let mut generation = 0;
        self.overlay_tx.send_modify(|overlay| {
            generation = self.toast_generation.fetch_add(1, Ordering::SeqCst) + 1;
            overlay.xp_toast = Some(amount);
        });
        self.emit(ProgressionEvent::XpEarned {
            amount,
            reason,
            total_xp,
        });

        let hub = Arc::downgrade(self);
        let delay = self.timing.xp_toast;
        tokio::spawn(async move {
            sleep(delay).await;
            if let Some(hub) = hub.upgrade() {
                hub.expire_xp_toast(generation);
            }
        });
    }

    fn show_level_up(self: &Arc<Self>, outcome: &AwardOutcome) {
        let mut generation = 0;
        self.overlay_tx.send_modify(|overlay| {
            generation = self.level_up_generation.fetch_add(1, Ordering::SeqCst) + 1;
            overlay.level_up = Some(LevelUpNotice {
                level: outcome.new_state.level,
                title: outcome.new_state.title.clone(),
            });
        });
        self.emit(ProgressionEvent::LevelUp {
            previous_level: outcome.previous_level,
            new_level: outcome.new_state.level,
            title: outcome.new_state.title.clone(),
        });

        let hub = Arc::downgrade(self);
        let delay = self.timing.level_up;
        tokio::spawn(async move {
            sleep(delay).await;
            if let Some(hub) = hub.upgrade() {
                hub.expire_level_up(generation);
            }
        });
    }

    fn expire_xp_toast(&self, generation: u64) {
        // A newer toast restarts the timer; only the latest one may clear it
        let expired = self.overlay_tx.send_if_modified(|overlay| {
            self.toast_generation.load(Ordering::SeqCst) == generation
                && overlay.xp_toast.take().is_some()
        });
        if expired {
            self.emit(ProgressionEvent::XpToastExpired);
        }
    }

    fn expire_level_up(&self, generation: u64) {
        let expired = self.overlay_tx.send_if_modified(|overlay| {
            self.level_up_generation.load(Ordering::SeqCst) == generation
                && overlay.level_up.take().is_some()
        });
        if expired {
            self.emit(ProgressionEvent::LevelUpExpired);
        }
    }

    fn emit(&self, event: ProgressionEvent) {
        let ids: Vec<u64> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        for id in ids {
            // Callbacks run unlocked; skip any unsubscribed since the snapshot
            let listener = self
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&id)
                .cloned();
            if let Some(listener) = listener {
                listener(&event);
            }
        }
        if self.events_tx.send(event).is_err() {
            trace!("No event receivers");
        }
    }
}
