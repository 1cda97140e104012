// ABOUTME: Error taxonomy for progression lookups and XP awards
// ABOUTME: Pure computation errors surface synchronously before any state mutation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use super::ErrorCode;
use thiserror::Error;

/// Errors raised by the leveling engine and the award transaction.
///
/// `InvalidInput` and `InvalidAmount` are returned to the caller before any
/// state changes. `StoreUnavailable` is absorbed by the engine and only shows
/// up in logs and dead letters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressionError {
    /// A cumulative XP total was negative
    #[error("cumulative XP must be non-negative, got {value}")]
    InvalidInput {
        /// The rejected total
        value: i64,
    },
    /// An award amount was zero, negative, or would overflow the total
    #[error("XP award amount must be positive and fit the total, got {value}")]
    InvalidAmount {
        /// The rejected amount
        value: i64,
    },
    /// A durable or local store could not be read or written
    #[error("{store} unavailable: {reason}")]
    StoreUnavailable {
        /// Which store failed
        store: &'static str,
        /// Underlying failure
        reason: String,
    },
    /// A level table violated ordering or starting-threshold rules
    #[error("invalid level table: {reason}")]
    InvalidLevelTable {
        /// What was wrong with the table
        reason: String,
    },
}

impl ProgressionError {
    /// Map onto the shared error code space
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput { .. } => ErrorCode::InvalidInput,
            Self::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            Self::StoreUnavailable { .. } => ErrorCode::StoreUnavailable,
            Self::InvalidLevelTable { .. } => ErrorCode::ConfigInvalid,
        }
    }

    /// Create an invalid level table error
    pub fn invalid_table(reason: impl Into<String>) -> Self {
        Self::InvalidLevelTable {
            reason: reason.into(),
        }
    }
}
