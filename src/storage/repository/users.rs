// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! User repository (credential store).
//!
//! Usernames are unique case-insensitively, enforced through the
//! `usernames` index table which stores the lowercased name.

use chrono::Utc;
use redb::ReadableTable;

use super::super::db::{AuthDatabase, StoreError, StoreResult, USERNAMES, USERS};
use super::super::models::StoredUser;

pub struct UserRepository<'a> {
    db: &'a AuthDatabase,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a AuthDatabase) -> Self {
        Self { db }
    }

    /// Create a new user, rejecting duplicate usernames (case-insensitive).
    pub fn create(&self, user: &StoredUser) -> StoreResult<()> {
        let json = serde_json::to_vec(user)?;
        let username_key = user.username.to_lowercase();

        let write_txn = self.db.begin_write()?;
        {
            let mut names = write_txn.open_table(USERNAMES)?;
            if names.get(username_key.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists(format!(
                    "username {}",
                    user.username
                )));
            }
            names.insert(username_key.as_str(), user.id.as_str())?;

            let mut users = write_txn.open_table(USERS)?;
            users.insert(user.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a user by id.
    pub fn get(&self, user_id: &str) -> StoreResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(user_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Look up a user by username, case-insensitively.
    pub fn get_by_username(&self, username: &str) -> StoreResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let names = read_txn.open_table(USERNAMES)?;
        let user_id = match names.get(username.to_lowercase().as_str())? {
            Some(v) => v.value().to_string(),
            None => return Ok(None),
        };
        let users = read_txn.open_table(USERS)?;
        match users.get(user_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Overwrite an existing user row.
    pub fn update(&self, user: &StoredUser) -> StoreResult<()> {
        let json = serde_json::to_vec(user)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            if users.get(user.id.as_str())?.is_none() {
                return Err(StoreError::NotFound(format!("user {}", user.id)));
            }
            users.insert(user.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Stamp the last-login timestamp, returning the updated row.
    pub fn touch_last_login(&self, user_id: &str) -> StoreResult<StoredUser> {
        let write_txn = self.db.begin_write()?;
        let user = {
            let mut users = write_txn.open_table(USERS)?;
            let existing_bytes = {
                let existing = users
                    .get(user_id)?
                    .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;
                existing.value().to_vec()
            };

            let mut user: StoredUser = serde_json::from_slice(&existing_bytes)?;
            user.last_login_at = Some(Utc::now());
            user.updated_at = Utc::now();

            let json = serde_json::to_vec(&user)?;
            users.insert(user_id, json.as_slice())?;
            user
        };
        write_txn.commit()?;
        Ok(user)
    }
}
