// ABOUTME: Main library entry point for the Ascend XP progression engine
// ABOUTME: Wires leveling, stores, notifications and the per-user award engine together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

#![deny(unsafe_code)]

//! # Ascend
//!
//! Gamification core for a habit and workout tracker. Users earn XP for
//! activities; the cumulative total maps onto a level, a title and a progress
//! fraction through a [`LevelingPolicy`](ascend_leveling::LevelingPolicy).
//!
//! ## Architecture
//!
//! - **Leveling** (`ascend-leveling`): pure XP to level resolution
//! - **Storage**: durable profile store, local XP cache, XP history sink
//! - **Progression**: the per-user award engine, its background persister,
//!   notification hub and the session registry
//! - **Config**: environment-driven settings
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ascend::config::environment::ProgressionConfig;
//! use ascend::errors::AppResult;
//! use ascend::models::XpActivity;
//! use ascend::progression::{EngineDeps, SessionRegistry};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ProgressionConfig::from_env()?;
//!     let deps = EngineDeps::from_config(&config).await?;
//!     let registry = SessionRegistry::new(deps);
//!
//!     let engine = registry.get_or_start(Uuid::new_v4()).await;
//!     let outcome = engine.award_activity(XpActivity::WorkoutComplete).await?;
//!     println!("level {} ({})", outcome.new_state.level, outcome.new_state.title);
//!
//!     registry.shutdown_all().await;
//!     Ok(())
//! }
//! ```

/// Environment-driven configuration
pub mod config;

/// Shared constants (level table, XP rules, timings)
pub mod constants;

/// Unified error handling
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Domain models re-exported from `ascend-core`
pub mod models;

/// Award engine, persister, notifications and session registry
pub mod progression;

/// Bounded exponential backoff for store writes
pub mod retry;

/// Profile store, local cache and history adapters
pub mod storage;

pub use ascend_leveling::{
    advance_streak, earns_streak_bonus, resolve_progression, standard_policy, GeometricPolicy,
    LevelingPolicy, TieredPolicy,
};
