// ABOUTME: Domain models re-exported from ascend-core
// ABOUTME: Progression state, level tiers, award outcomes, activities and profile records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

pub use ascend_core::models::*;
