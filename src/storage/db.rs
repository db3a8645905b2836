// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! Embedded auth database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser
//! - `usernames`: lowercase username → user_id (case-insensitive uniqueness)
//! - `devices`: device_id → serialized StoredDevice
//! - `sessions`: session_id → serialized StoredSession
//! - `settings`: user_id → serialized StoredSettings
//! - `audit_log`: sequence number → serialized AuditEntry
//!
//! The database is the single source of truth for session validity. No
//! in-process session cache exists, so multiple server instances can share
//! one data directory safely.

use std::path::Path;

use redb::{Database, ReadTransaction, ReadableDatabase, TableDefinition, WriteTransaction};

/// Primary user table: user_id → serialized StoredUser (JSON bytes).
pub(crate) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Index: lowercase username → user_id. Enforces case-insensitive uniqueness.
pub(crate) const USERNAMES: TableDefinition<&str, &str> = TableDefinition::new("usernames");

/// Device registry: device_id → serialized StoredDevice.
/// The device_id is globally unique, so it is the primary key.
pub(crate) const DEVICES: TableDefinition<&str, &[u8]> = TableDefinition::new("devices");

/// Session records: session_id → serialized StoredSession.
pub(crate) const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Per-user business settings: user_id → serialized StoredSettings.
pub(crate) const SETTINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");

/// Append-only audit trail: sequence number → serialized AuditEntry.
pub(crate) const AUDIT_LOG: TableDefinition<u64, &[u8]> = TableDefinition::new("audit_log");

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Embedded ACID database holding users, devices, and sessions.
pub struct AuthDatabase {
    db: Database,
}

impl AuthDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERNAMES)?;
            let _ = write_txn.open_table(DEVICES)?;
            let _ = write_txn.open_table(SESSIONS)?;
            let _ = write_txn.open_table(SETTINGS)?;
            let _ = write_txn.open_table(AUDIT_LOG)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Begin a read transaction.
    pub(crate) fn begin_read(&self) -> StoreResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    /// Begin an exclusive write transaction.
    ///
    /// redb write transactions are serialized, which is what makes the
    /// device-limit check-then-insert sequence atomic.
    pub(crate) fn begin_write(&self) -> StoreResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }
}
