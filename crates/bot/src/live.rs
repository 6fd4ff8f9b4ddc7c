//! Live-sharing session registry and its expiry sweeper.
//!
//! A live session is one chat-platform live-location stream, keyed by
//! `(chat_id, message_id)`. The registry is process-wide state shared
//! between ingestion and the sweeper; each mutation takes the write
//! lock for the whole criterion, so upserts are atomic per key.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use geoclock_core::Timestamp;
use geoclock_store::registry::DatabaseRegistry;
use geoclock_store::retry;

/// `(chat_id, message_id)` of the live-location stream.
pub type LiveKey = (i64, i64);

/// How often the sweeper looks for expired sessions.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Tolerance for absent live updates before a session is finalized.
pub const GRACE_MS: i64 = 120_000;

#[derive(Debug, Clone)]
pub struct LiveSession {
    pub employee_id: String,
    pub project_name: String,
    /// When the stream is expected to end; `None` when the duration was
    /// never observed.
    pub live_until_ms: Option<i64>,
    pub last_update_ms: i64,
}

pub struct LiveSessionRegistry {
    sessions: RwLock<HashMap<LiveKey, LiveSession>>,
}

impl LiveSessionRegistry {
    pub fn new() -> Self {
        LiveSessionRegistry {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Apply the upsert rules for one ingested location event and return
    /// the effective live state:
    ///
    /// - a positive `live_period_secs` (re)creates the entry with a fresh
    ///   deadline;
    /// - an existing entry has its `last_update_ms` advanced, keeping its
    ///   deadline;
    /// - an edited-message event for an unseen key creates an entry with
    ///   an unknown deadline;
    /// - a static share with no prior entry leaves the registry alone and
    ///   is not live.
    pub async fn observe(
        &self,
        key: LiveKey,
        employee_id: &str,
        project_name: &str,
        live_period_secs: Option<i64>,
        is_edit: bool,
        now_ms: i64,
    ) -> bool {
        let mut sessions = self.sessions.write().await;

        if let Some(period) = live_period_secs.filter(|period| *period > 0) {
            sessions.insert(
                key,
                LiveSession {
                    employee_id: employee_id.to_string(),
                    project_name: project_name.to_string(),
                    live_until_ms: Some(now_ms + period * 1000),
                    last_update_ms: now_ms,
                },
            );
            return true;
        }

        if let Some(session) = sessions.get_mut(&key) {
            session.last_update_ms = now_ms;
            return true;
        }

        if is_edit {
            sessions.insert(
                key,
                LiveSession {
                    employee_id: employee_id.to_string(),
                    project_name: project_name.to_string(),
                    live_until_ms: None,
                    last_update_ms: now_ms,
                },
            );
            return true;
        }

        false
    }

    pub async fn get(&self, key: LiveKey) -> Option<LiveSession> {
        self.sessions.read().await.get(&key).cloned()
    }

    pub async fn remove(&self, key: LiveKey) {
        self.sessions.write().await.remove(&key);
    }

    pub async fn snapshot(&self) -> Vec<(LiveKey, LiveSession)> {
        self.sessions
            .read()
            .await
            .iter()
            .map(|(key, session)| (*key, session.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for LiveSessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodic task that finalizes expired live sessions.
pub struct LiveSessionSweeper {
    registry: Arc<LiveSessionRegistry>,
    databases: Arc<DatabaseRegistry>,
}

impl LiveSessionSweeper {
    pub fn new(registry: Arc<LiveSessionRegistry>, databases: Arc<DatabaseRegistry>) -> Self {
        LiveSessionSweeper {
            registry,
            databases,
        }
    }

    /// Run the sweep loop until `cancel` is triggered.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = SWEEP_INTERVAL.as_secs(),
            grace_ms = GRACE_MS,
            "Live-session sweeper started"
        );

        let mut interval = tokio::time::interval(SWEEP_INTERVAL);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Live-session sweeper stopping");
                    break;
                }
                _ = interval.tick() => {
                    self.sweep(Utc::now()).await;
                }
            }
        }
    }

    /// Finalize every session past its threshold.
    ///
    /// The threshold is the earlier of the declared deadline and the last
    /// update plus the grace window. Finalization is best-effort: a store
    /// failure keeps the entry for the next sweep.
    pub async fn sweep(&self, now: Timestamp) {
        let now_ms = now.timestamp_millis();

        for (key, session) in self.registry.snapshot().await {
            let deadline = session.last_update_ms + GRACE_MS;
            let threshold = match session.live_until_ms {
                Some(until) => until.min(deadline),
                None => deadline,
            };
            if now_ms < threshold {
                continue;
            }

            let Some(db) = self.databases.get(&session.project_name) else {
                tracing::warn!(
                    project = %session.project_name,
                    employee_id = %session.employee_id,
                    "No database handle for live session, keeping entry"
                );
                continue;
            };

            let finalized = retry::with_retry(db.project_name(), "finalize_live_location", || {
                db.finalize_live_location(&session.employee_id, now)
            })
            .await;

            match finalized {
                Ok(()) => {
                    self.registry.remove(key).await;
                    tracing::info!(
                        employee_id = %session.employee_id,
                        chat_id = key.0,
                        message_id = key.1,
                        "Live session finalized"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        employee_id = %session.employee_id,
                        error = %e,
                        "Failed to finalize live session, will retry next sweep"
                    );
                }
            }
        }
    }
}
