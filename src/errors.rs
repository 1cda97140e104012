// ABOUTME: Unified error types re-exported from ascend-core
// ABOUTME: AppError with numeric codes plus the pure ProgressionError taxonomy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

//! # Unified Error Handling
//!
//! Store, config and CLI plumbing return [`AppResult`]. Leveling and award
//! validation failures are [`ProgressionError`] and convert into [`AppError`]
//! keeping their code.

pub use ascend_core::errors::*;
