// ABOUTME: XP award engine, background persister, notification hub and session registry
// ABOUTME: The stateful half of the system built on the pure leveling crate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

/// Per-user award engine
pub mod engine;
/// State, event and overlay fan-out
pub mod notifications;
/// Background durable writer with retry and dead letters
pub mod persister;
/// One engine per user per process
pub mod registry;

pub use engine::{reconcile_starting_xp, EngineDeps, ProgressionEngine};
pub use notifications::{
    LevelUpNotice, NotificationHub, NotificationOverlay, NotificationTiming, ProgressionEvent,
    Subscription,
};
pub use persister::{DeadLetter, DurablePersister, FailedWrite};
pub use registry::SessionRegistry;
