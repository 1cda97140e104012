// ABOUTME: Configuration module for the progression engine
// ABOUTME: Environment-driven settings for stores, leveling policy and persistence retry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

//! Configuration for Ascend
//!
//! Everything is read from environment variables once at startup by
//! [`environment::ProgressionConfig::from_env`]. Malformed numeric values fall
//! back to their defaults with a warning; an unknown leveling policy is an error.

/// Environment variable parsing and typed configuration
pub mod environment;

pub use environment::{
    DatabaseUrl, Environment, GeometricConfig, LevelingPolicyKind, PersistenceConfig,
    ProgressionConfig,
};
