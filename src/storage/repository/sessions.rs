// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! Session repository.
//!
//! One row per issued token pair. Rows hold token hashes only. Validity
//! is authoritative here: a session with `is_valid == false` or a past
//! expiry always fails authentication, and an invalidated session is
//! never revalidated.

use chrono::{DateTime, Duration, Utc};
use redb::ReadableTable;

use super::super::db::{AuthDatabase, StoreError, StoreResult, SESSIONS};
use super::super::models::StoredSession;

/// How long invalid sessions are retained before the sweep deletes them.
pub const INVALID_RETENTION_DAYS: i64 = 7;

pub struct SessionRepository<'a> {
    db: &'a AuthDatabase,
}

impl<'a> SessionRepository<'a> {
    pub fn new(db: &'a AuthDatabase) -> Self {
        Self { db }
    }

    /// Persist a freshly issued session.
    pub fn insert(&self, session: &StoredSession) -> StoreResult<()> {
        let json = serde_json::to_vec(session)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            if table.get(session.session_id.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists(format!(
                    "session {}",
                    session.session_id
                )));
            }
            table.insert(session.session_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a session by identifier.
    pub fn get(&self, session_id: &str) -> StoreResult<Option<StoredSession>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;
        match table.get(session_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Update the last-activity timestamp of a session.
    pub fn touch(&self, session_id: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            let existing_bytes = {
                let existing = table
                    .get(session_id)?
                    .ok_or_else(|| StoreError::NotFound(format!("session {session_id}")))?;
                existing.value().to_vec()
            };

            let mut session: StoredSession = serde_json::from_slice(&existing_bytes)?;
            session.last_activity = Utc::now();

            let json = serde_json::to_vec(&session)?;
            table.insert(session_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Mark one session invalid.
    ///
    /// Idempotent: returns `true` the first time, `false` if the session
    /// is already invalid or does not exist.
    pub fn invalidate(&self, session_id: &str) -> StoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let changed = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let existing = match table.get(session_id)? {
                Some(value) => serde_json::from_slice::<StoredSession>(value.value())?,
                None => return Ok(false),
            };
            if !existing.is_valid {
                return Ok(false);
            }

            let mut session = existing;
            session.is_valid = false;
            let json = serde_json::to_vec(&session)?;
            table.insert(session_id, json.as_slice())?;
            true
        };
        write_txn.commit()?;
        Ok(changed)
    }

    /// Mark every valid session of a user invalid. Returns the count.
    ///
    /// Used when an account is deactivated; the per-device variant lives
    /// in the device repository so it can touch both tables atomically.
    pub fn invalidate_all(&self, user_id: &str) -> StoreResult<usize> {
        let write_txn = self.db.begin_write()?;
        let count = {
            let mut table = write_txn.open_table(SESSIONS)?;

            let mut targets = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                let session: StoredSession = serde_json::from_slice(value.value())?;
                if session.user_id == user_id && session.is_valid {
                    targets.push((key.value().to_string(), session));
                }
            }
            for (key, session) in &mut targets {
                session.is_valid = false;
                let json = serde_json::to_vec(session)?;
                table.insert(key.as_str(), json.as_slice())?;
            }
            targets.len()
        };
        write_txn.commit()?;
        Ok(count)
    }

    /// Delete sessions that are expired, or invalid and inactive for
    /// longer than the retention window. Valid unexpired sessions are
    /// never touched, so the sweep is safe to run concurrently with live
    /// validation.
    pub fn sweep(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let retention = Duration::days(INVALID_RETENTION_DAYS);
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(SESSIONS)?;

            let mut stale = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                let session: StoredSession = serde_json::from_slice(value.value())?;
                let expired = session.expires_at <= now;
                let long_dead = !session.is_valid && session.last_activity + retention <= now;
                if expired || long_dead {
                    stale.push(key.value().to_string());
                }
            }
            for key in &stale {
                table.remove(key.as_str())?;
            }
            stale.len()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// All sessions for a user (diagnostics and tests).
    pub fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<StoredSession>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;

        let mut sessions = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let session: StoredSession = serde_json::from_slice(value.value())?;
            if session.user_id == user_id {
                sessions.push(session);
            }
        }
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (AuthDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = AuthDatabase::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn sample_session(user_id: &str, session_id: &str) -> StoredSession {
        let now = Utc::now();
        StoredSession {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            device_id: "dev-1".to_string(),
            access_token_hash: "access-hash".to_string(),
            refresh_token_hash: "refresh-hash".to_string(),
            is_valid: true,
            expires_at: now + Duration::days(7),
            created_at: now,
            last_activity: now,
            ip_address: Some("203.0.113.7".to_string()),
            user_agent: Some("ParkEase/1.4 (android)".to_string()),
        }
    }

    #[test]
    fn insert_and_get_session() {
        let (db, _dir) = temp_db();
        let repo = SessionRepository::new(&db);

        let session = sample_session("user-1", "sess-1");
        repo.insert(&session).unwrap();

        let loaded = repo.get("sess-1").unwrap().unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn duplicate_session_id_rejected() {
        let (db, _dir) = temp_db();
        let repo = SessionRepository::new(&db);

        repo.insert(&sample_session("user-1", "sess-1")).unwrap();
        let result = repo.insert(&sample_session("user-1", "sess-1"));
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
    }

    #[test]
    fn invalidate_is_idempotent() {
        let (db, _dir) = temp_db();
        let repo = SessionRepository::new(&db);

        repo.insert(&sample_session("user-1", "sess-1")).unwrap();

        assert!(repo.invalidate("sess-1").unwrap());
        assert!(!repo.invalidate("sess-1").unwrap());
        assert!(!repo.invalidate("sess-missing").unwrap());

        // Once invalid, never revalidated.
        let session = repo.get("sess-1").unwrap().unwrap();
        assert!(!session.is_valid);
    }

    #[test]
    fn invalidate_all_counts_only_valid_rows() {
        let (db, _dir) = temp_db();
        let repo = SessionRepository::new(&db);

        repo.insert(&sample_session("user-1", "sess-0")).unwrap();
        repo.insert(&sample_session("user-1", "sess-1")).unwrap();
        repo.insert(&sample_session("user-2", "other-user")).unwrap();
        repo.invalidate("sess-0").unwrap();

        assert_eq!(repo.invalidate_all("user-1").unwrap(), 1);
        assert_eq!(repo.invalidate_all("user-1").unwrap(), 0);
        // Other users untouched.
        assert!(repo.get("other-user").unwrap().unwrap().is_valid);
    }

    #[test]
    fn sweep_removes_expired_and_long_dead_only() {
        let (db, _dir) = temp_db();
        let repo = SessionRepository::new(&db);
        let now = Utc::now();

        // Valid and current: kept.
        repo.insert(&sample_session("user-1", "sess-live")).unwrap();

        // Expired: deleted even though still marked valid.
        let mut expired = sample_session("user-1", "sess-expired");
        expired.expires_at = now - Duration::seconds(1);
        repo.insert(&expired).unwrap();

        // Invalid but recent: retained for the 7-day window.
        let mut recent_dead = sample_session("user-1", "sess-recent-dead");
        recent_dead.is_valid = false;
        repo.insert(&recent_dead).unwrap();

        // Invalid and stale: deleted.
        let mut long_dead = sample_session("user-1", "sess-long-dead");
        long_dead.is_valid = false;
        long_dead.last_activity = now - Duration::days(INVALID_RETENTION_DAYS + 1);
        repo.insert(&long_dead).unwrap();

        let removed = repo.sweep(now).unwrap();
        assert_eq!(removed, 2);

        assert!(repo.get("sess-live").unwrap().is_some());
        assert!(repo.get("sess-recent-dead").unwrap().is_some());
        assert!(repo.get("sess-expired").unwrap().is_none());
        assert!(repo.get("sess-long-dead").unwrap().is_none());
    }

    #[test]
    fn touch_updates_last_activity() {
        let (db, _dir) = temp_db();
        let repo = SessionRepository::new(&db);

        let session = sample_session("user-1", "sess-1");
        repo.insert(&session).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        repo.touch("sess-1").unwrap();

        let loaded = repo.get("sess-1").unwrap().unwrap();
        assert!(loaded.last_activity > session.last_activity);
    }
}
