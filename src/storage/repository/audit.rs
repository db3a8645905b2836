// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! Append-only audit trail for auth events.
//!
//! Recording is best-effort: callers log failures and carry on, an audit
//! miss must never fail the request it describes.

use chrono::Utc;
use redb::ReadableTable;

use super::super::db::{AuthDatabase, StoreResult, AUDIT_LOG};
use super::super::models::AuditEntry;

pub struct AuditRepository<'a> {
    db: &'a AuthDatabase,
}

impl<'a> AuditRepository<'a> {
    pub fn new(db: &'a AuthDatabase) -> Self {
        Self { db }
    }

    /// Append one audit entry.
    pub fn record(
        &self,
        user_id: &str,
        action: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> StoreResult<()> {
        let entry = AuditEntry {
            user_id: user_id.to_string(),
            action: action.to_string(),
            ip_address: ip_address.map(str::to_string),
            user_agent: user_agent.map(str::to_string),
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec(&entry)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(AUDIT_LOG)?;
            let next_seq = match table.last()? {
                Some((key, _)) => key.value() + 1,
                None => 0,
            };
            table.insert(next_seq, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// All entries for a user, oldest first (diagnostics and tests).
    pub fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<AuditEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_LOG)?;

        let mut entries = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let parsed: AuditEntry = serde_json::from_slice(value.value())?;
            if parsed.user_id == user_id {
                entries.push(parsed);
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let db = AuthDatabase::open(&dir.path().join("test.redb")).unwrap();
        let repo = AuditRepository::new(&db);

        repo.record("user-1", "user_signup", Some("203.0.113.7"), None)
            .unwrap();
        repo.record("user-1", "login", None, Some("ParkEase/1.4"))
            .unwrap();
        repo.record("user-2", "login", None, None).unwrap();

        let entries = repo.list_for_user("user-1").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "user_signup");
        assert_eq!(entries[1].action, "login");
        assert_eq!(entries[1].user_agent.as_deref(), Some("ParkEase/1.4"));
    }
}
