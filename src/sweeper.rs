// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! # Session Sweeper
//!
//! Background task that periodically deletes dead session rows. Expired
//! sessions are removed outright; invalidated sessions are kept for a
//! short retention window (for diagnostics) and then removed.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::storage::{AuthDatabase, SessionRepository};

/// Default interval between sweeps.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Background sweeper that prunes expired and invalidated sessions.
pub struct SessionSweeper {
    db: Arc<AuthDatabase>,
    sweep_interval: Duration,
}

impl SessionSweeper {
    pub fn new(db: Arc<AuthDatabase>) -> Self {
        Self {
            db,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    #[cfg(test)]
    fn with_interval(db: Arc<AuthDatabase>, sweep_interval: Duration) -> Self {
        Self { db, sweep_interval }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            "Session sweeper starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Session sweeper shutting down");
                return;
            }

            self.sweep_step();

            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Session sweeper shutting down");
                    return;
                }
            }
        }
    }

    /// Execute one sweep.
    fn sweep_step(&self) {
        match SessionRepository::new(&self.db).sweep(Utc::now()) {
            Ok(0) => {}
            Ok(removed) => {
                info!(removed, "Session sweeper: pruned dead sessions");
            }
            Err(e) => {
                warn!(error = %e, "Session sweeper: sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoredSession;
    use chrono::Duration as ChronoDuration;

    fn expired_session(session_id: &str) -> StoredSession {
        let now = Utc::now();
        StoredSession {
            session_id: session_id.to_string(),
            user_id: "user-1".to_string(),
            device_id: "dev-1".to_string(),
            access_token_hash: "a".to_string(),
            refresh_token_hash: "r".to_string(),
            is_valid: true,
            expires_at: now - ChronoDuration::hours(1),
            created_at: now - ChronoDuration::days(31),
            last_activity: now - ChronoDuration::days(1),
            ip_address: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn sweep_step_prunes_expired_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(AuthDatabase::open(&dir.path().join("test.redb")).unwrap());

        let sessions = SessionRepository::new(&db);
        sessions.insert(&expired_session("sess-old")).unwrap();

        let sweeper = SessionSweeper::new(Arc::clone(&db));
        sweeper.sweep_step();

        assert!(sessions.get("sess-old").unwrap().is_none());
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(AuthDatabase::open(&dir.path().join("test.redb")).unwrap());

        let sweeper = SessionSweeper::with_interval(db, Duration::from_secs(3600));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(sweeper.run(shutdown.clone()));

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
