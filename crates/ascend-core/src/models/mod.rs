// ABOUTME: Core data models for XP progression
// ABOUTME: Re-exports level tiers, progression state, activities, awards and profile records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

//! # Data Models
//!
//! - `LevelTier`: one row of a level table
//! - `ProgressionState`: derived view of a cumulative XP total
//! - `XpActivity`: closed set of XP-earning activities
//! - `XpAwardEvent` / `AwardOutcome`: what an award did
//! - `ProfileXp`: the durable per-user record

mod activity;
mod award;
mod level;
mod profile;

pub use activity::XpActivity;
pub use award::{AwardOutcome, DailyLoginOutcome, XpAwardEvent};
pub use level::{LevelTier, ProgressionState};
pub use profile::ProfileXp;
