// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! Business settings repository.
//!
//! Only the seeding path is in scope here: new guest signups get a default
//! rate card so the app is usable immediately. The full settings CRUD
//! surface lives with the business endpoints, outside the auth core.

use redb::ReadableTable;

use super::super::db::{AuthDatabase, StoreResult, SETTINGS};
use super::super::models::StoredSettings;

pub struct SettingsRepository<'a> {
    db: &'a AuthDatabase,
}

impl<'a> SettingsRepository<'a> {
    pub fn new(db: &'a AuthDatabase) -> Self {
        Self { db }
    }

    /// Seed default settings for a user if none exist yet.
    pub fn seed_defaults(&self, settings: &StoredSettings) -> StoreResult<()> {
        let json = serde_json::to_vec(settings)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SETTINGS)?;
            if table.get(settings.user_id.as_str())?.is_some() {
                // Already seeded, nothing to do.
                return Ok(());
            }
            table.insert(settings.user_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Settings for a user.
    pub fn get(&self, user_id: &str) -> StoreResult<Option<StoredSettings>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SETTINGS)?;
        match table.get(user_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}
