// ABOUTME: Application constants re-exported from ascend-core
// ABOUTME: Level table, XP rule amounts, notification timings and env var names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

//! Constants shared by every crate in the workspace live in `ascend-core`;
//! this module keeps the `crate::constants::*` paths stable for the root crate.

pub use ascend_core::constants::*;
