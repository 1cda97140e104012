// ABOUTME: Local XP cache persisted as a JSON map of user id to total
// ABOUTME: Writes go to a temp file then rename, so a crash never leaves a torn cache
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use super::LocalCache;
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// `{ "<uuid>": <xp> }` stored at a single path
#[derive(Debug)]
pub struct FileLocalCache {
    path: PathBuf,
    totals: Mutex<BTreeMap<Uuid, u64>>,
}

impl FileLocalCache {
    /// Open the cache file, creating its directory if needed
    ///
    /// A missing file starts an empty cache. A corrupt file is logged and
    /// replaced on the next write.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be created or the
    /// file cannot be read
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::storage(format!(
                    "Failed to create cache directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let totals = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Corrupt XP cache, starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(AppError::storage(format!(
                    "Failed to read XP cache {}: {e}",
                    path.display()
                )))
            }
        };

        debug!(path = %path.display(), users = totals.len(), "XP cache opened");
        Ok(Self {
            path,
            totals: Mutex::new(totals),
        })
    }

    /// Location of the cache file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_file(&self, totals: &BTreeMap<Uuid, u64>) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(totals)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes).await.map_err(|e| {
            AppError::storage(format!("Failed to write {}: {e}", tmp_path.display()))
        })?;
        fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            AppError::storage(format!("Failed to replace {}: {e}", self.path.display()))
        })
    }
}

#[async_trait]
impl LocalCache for FileLocalCache {
    async fn get_xp(&self, user_id: Uuid) -> AppResult<Option<u64>> {
        Ok(self.totals.lock().await.get(&user_id).copied())
    }

    async fn set_xp(&self, user_id: Uuid, xp: u64) -> AppResult<()> {
        // Hold the lock across the write so files land in call order
        let mut totals = self.totals.lock().await;
        let previous = totals.insert(user_id, xp);
        if let Err(e) = self.write_file(&totals).await {
            match previous {
                Some(old) => totals.insert(user_id, old),
                None => totals.remove(&user_id),
            };
            return Err(e);
        }
        Ok(())
    }
}
