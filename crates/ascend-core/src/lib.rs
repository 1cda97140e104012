// ABOUTME: Core types and constants for the Ascend XP progression engine
// ABOUTME: Foundation crate with error handling, rule tables, and progression models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

#![deny(unsafe_code)]

//! # Ascend Core
//!
//! Foundation crate providing shared types and constants for the Ascend
//! progression engine. The level table, XP rule table and error taxonomy live
//! here so that the pure leveling crate and the async engine agree on them.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `ProgressionError`
//! - **constants**: Level table, XP rules, notification timings, persistence defaults
//! - **models**: `LevelTier`, `ProgressionState`, `XpActivity`, award and profile records

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core progression data models
pub mod models;
