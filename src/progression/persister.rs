// ABOUTME: Single-writer background task for durable profile and history writes
// ABOUTME: Coalesces queued totals, retries with backoff and keeps a bounded dead-letter list
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

use crate::constants::persistence::MAX_DEAD_LETTERS;
use crate::errors::AppError;
use crate::models::XpAwardEvent;
use crate::retry::RetryPolicy;
use crate::storage::{ProfileStore, XpHistorySink};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// A durable write that could not be completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailedWrite {
    /// XP total and level
    Progress {
        /// Total that was being written
        xp: u64,
        /// Level that was being written
        level: u32,
    },
    /// Login streak
    Streak {
        /// Streak that was being written
        streak_days: u32,
        /// Day of the login
        last_active_on: NaiveDate,
    },
    /// History ledger entry
    History {
        /// Event that was being recorded
        event: XpAwardEvent,
    },
}

/// Record of a write abandoned after its retries ran out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadLetter {
    /// Owner of the write
    pub user_id: Uuid,
    /// What was being written
    pub write: FailedWrite,
    /// Last error seen
    pub error: String,
    /// When the write was abandoned
    pub failed_at: DateTime<Utc>,
}

#[derive(Debug)]
enum PersistCommand {
    Progress { xp: u64, level: u32 },
    Streak { streak_days: u32, last_active_on: NaiveDate },
    History(XpAwardEvent),
    Flush(oneshot::Sender<()>),
}

type DeadLetters = Arc<Mutex<VecDeque<DeadLetter>>>;

/// Handle to the background persister of one engine
#[derive(Debug)]
pub struct DurablePersister {
    user_id: Uuid,
    sender: Mutex<Option<mpsc::UnboundedSender<PersistCommand>>>,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
    dead_letters: DeadLetters,
}

impl DurablePersister {
    /// Spawn the writer task
    #[must_use]
    pub fn spawn(
        user_id: Uuid,
        profile_store: Arc<dyn ProfileStore>,
        history: Option<Arc<dyn XpHistorySink>>,
        retry: RetryPolicy,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let dead_letters: DeadLetters = Arc::new(Mutex::new(VecDeque::new()));
        let worker = PersistWorker {
            user_id,
            profile_store,
            history,
            retry,
            dead_letters: Arc::clone(&dead_letters),
        };
        let handle = tokio::spawn(worker.run(receiver));

        Self {
            user_id,
            sender: Mutex::new(Some(sender)),
            worker: tokio::sync::Mutex::new(Some(handle)),
            dead_letters,
        }
    }

    /// Queue a total for the profile store
    pub fn enqueue_progress(&self, xp: u64, level: u32) {
        self.send(
            PersistCommand::Progress { xp, level },
            FailedWrite::Progress { xp, level },
        );
    }

    /// Queue a streak update for the profile store
    pub fn enqueue_streak(&self, streak_days: u32, last_active_on: NaiveDate) {
        self.send(
            PersistCommand::Streak {
                streak_days,
                last_active_on,
            },
            FailedWrite::Streak {
                streak_days,
                last_active_on,
            },
        );
    }

    /// Queue a history ledger entry
    pub fn enqueue_history(&self, event: XpAwardEvent) {
        self.send(
            PersistCommand::History(event.clone()),
            FailedWrite::History { event },
        );
    }

    /// Wait until every write queued before this call has been attempted
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        let queued = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|sender| sender.send(PersistCommand::Flush(ack_tx)).is_ok());
        if queued && ack_rx.await.is_err() {
            warn!(user.id = %self.user_id, "Persister stopped before acknowledging flush");
        }
    }

    /// Close the queue and wait for pending writes to drain
    pub async fn shutdown(&self) {
        drop(
            self.sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(user.id = %self.user_id, error = %e, "Persister task failed");
            }
        }
    }

    /// Writes abandoned so far, oldest first
    #[must_use]
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    fn send(&self, command: PersistCommand, write: FailedWrite) {
        let sent = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|sender| sender.send(command).is_ok());
        if !sent {
            push_dead_letter(
                &self.dead_letters,
                DeadLetter {
                    user_id: self.user_id,
                    write,
                    error: "persister is shut down".to_owned(),
                    failed_at: Utc::now(),
                },
            );
        }
    }
}

struct PersistWorker {
    user_id: Uuid,
    profile_store: Arc<dyn ProfileStore>,
    history: Option<Arc<dyn XpHistorySink>>,
    retry: RetryPolicy,
    dead_letters: DeadLetters,
}

#[derive(Default)]
struct Batch {
    progress: Option<(u64, u32)>,
    streak: Option<(u32, NaiveDate)>,
    history: Vec<XpAwardEvent>,
    flushes: Vec<oneshot::Sender<()>>,
}

impl Batch {
    fn push(&mut self, command: PersistCommand) {
        match command {
            PersistCommand::Progress { xp, level } => {
                // Totals only grow, so the largest queued one supersedes the rest
                match self.progress {
                    Some((queued, _)) if queued > xp => {}
                    _ => self.progress = Some((xp, level)),
                }
            }
            PersistCommand::Streak {
                streak_days,
                last_active_on,
            } => self.streak = Some((streak_days, last_active_on)),
            PersistCommand::History(event) => self.history.push(event),
            PersistCommand::Flush(ack) => self.flushes.push(ack),
        }
    }
}

impl PersistWorker {
    async fn run(self, mut receiver: mpsc::UnboundedReceiver<PersistCommand>) {
        while let Some(first) = receiver.recv().await {
            let mut batch = Batch::default();
            batch.push(first);
            while let Ok(command) = receiver.try_recv() {
                batch.push(command);
            }
            self.write_batch(batch).await;
        }
        debug!(user.id = %self.user_id, "Persister drained");
    }

    async fn write_batch(&self, batch: Batch) {
        if let Some((xp, level)) = batch.progress {
            let store = Arc::clone(&self.profile_store);
            let user_id = self.user_id;
            let result = self
                .retry
                .run("save_progress", move || {
                    let store = Arc::clone(&store);
                    async move { store.save_progress(user_id, xp, level).await }
                })
                .await;
            if let Err(e) = result {
                self.dead_letter(FailedWrite::Progress { xp, level }, &e);
            }
        }

        if let Some((streak_days, last_active_on)) = batch.streak {
            let store = Arc::clone(&self.profile_store);
            let user_id = self.user_id;
            let result = self
                .retry
                .run("save_streak", move || {
                    let store = Arc::clone(&store);
                    async move {
                        store
                            .save_streak(user_id, streak_days, last_active_on)
                            .await
                    }
                })
                .await;
            if let Err(e) = result {
                self.dead_letter(
                    FailedWrite::Streak {
                        streak_days,
                        last_active_on,
                    },
                    &e,
                );
            }
        }

        if let Some(history) = &self.history {
            for event in batch.history {
                let sink = Arc::clone(history);
                let pending = event.clone();
                let result = self
                    .retry
                    .run("record_history", move || {
                        let sink = Arc::clone(&sink);
                        let event = pending.clone();
                        async move { sink.record(&event).await }
                    })
                    .await;
                if let Err(e) = result {
                    self.dead_letter(FailedWrite::History { event }, &e);
                }
            }
        }

        for ack in batch.flushes {
            // Receiver gone means the caller stopped waiting
            ack.send(()).ok();
        }
    }

    fn dead_letter(&self, write: FailedWrite, error: &AppError) {
        error!(
            user.id = %self.user_id,
            store = self.profile_store.name(),
            write = ?write,
            error = %error,
            "Durable write abandoned after retries, moved to dead letters"
        );
        push_dead_letter(
            &self.dead_letters,
            DeadLetter {
                user_id: self.user_id,
                write,
                error: error.to_string(),
                failed_at: Utc::now(),
            },
        );
    }
}

fn push_dead_letter(dead_letters: &DeadLetters, letter: DeadLetter) {
    let mut letters = dead_letters.lock().unwrap_or_else(PoisonError::into_inner);
    if letters.len() >= MAX_DEAD_LETTERS {
        letters.pop_front();
    }
    letters.push_back(letter);
}
