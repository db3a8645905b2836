// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! Device registry.
//!
//! Tracks device identities per user and enforces the concurrent-device
//! limit. The count-then-insert sequence runs inside a single redb write
//! transaction, so concurrent logins from the same account cannot slip
//! past the limit.

use chrono::{DateTime, Utc};

use redb::ReadableTable;

use super::super::db::{AuthDatabase, StoreResult, DEVICES, SESSIONS};
use super::super::models::{StoredDevice, StoredSession, StoredUser};

/// Outcome of a login-time device registration.
#[derive(Debug)]
pub enum DeviceRegistration {
    /// A new device row was inserted.
    Registered(StoredDevice),
    /// The device was already known; its row was refreshed and re-bound.
    Reactivated(StoredDevice),
    /// The user is at their device limit. Carries the current active
    /// device list so the client can offer a "log out elsewhere" flow.
    LimitReached(Vec<StoredDevice>),
}

/// Read-only device status for a user.
#[derive(Debug)]
pub struct DeviceStatus {
    pub devices: Vec<StoredDevice>,
    pub active_count: usize,
    pub max_devices: u32,
    pub multi_device_enabled: bool,
    pub can_add_more: bool,
}

pub struct DeviceRepository<'a> {
    db: &'a AuthDatabase,
}

impl<'a> DeviceRepository<'a> {
    pub fn new(db: &'a AuthDatabase) -> Self {
        Self { db }
    }

    /// Register a device at login, or reactivate it if the identifier is
    /// already known.
    ///
    /// Reactivation re-binds the device to `user`, refreshes its name,
    /// platform, and last-active timestamp, and never counts against the
    /// device limit a second time. A brand-new device is only inserted if
    /// the user is under their limit (or has multi-device enabled); the
    /// first active device for a user is marked primary.
    pub fn register_or_reactivate(
        &self,
        user: &StoredUser,
        device_id: &str,
        device_name: Option<&str>,
        platform: Option<&str>,
    ) -> StoreResult<DeviceRegistration> {
        let now = Utc::now();
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut devices = write_txn.open_table(DEVICES)?;

            let existing = match devices.get(device_id)? {
                Some(value) => Some(serde_json::from_slice::<StoredDevice>(value.value())?),
                None => None,
            };

            if let Some(mut device) = existing {
                device.user_id = user.id.clone();
                if device_name.is_some() {
                    device.device_name = device_name.map(str::to_string);
                }
                if platform.is_some() {
                    device.platform = platform.map(str::to_string);
                }
                device.is_active = true;
                device.last_active_at = now;

                let json = serde_json::to_vec(&device)?;
                devices.insert(device_id, json.as_slice())?;
                DeviceRegistration::Reactivated(device)
            } else {
                let active = active_devices_for(&devices, &user.id)?;

                if !user.multi_device_enabled && active.len() >= user.max_devices as usize {
                    return Ok(DeviceRegistration::LimitReached(active));
                }

                let device = StoredDevice {
                    device_id: device_id.to_string(),
                    user_id: user.id.clone(),
                    device_name: device_name.map(str::to_string),
                    platform: platform.map(str::to_string),
                    is_active: true,
                    is_primary: active.is_empty(),
                    last_active_at: now,
                    created_at: now,
                };

                let json = serde_json::to_vec(&device)?;
                devices.insert(device_id, json.as_slice())?;
                DeviceRegistration::Registered(device)
            }
        };
        write_txn.commit()?;
        Ok(outcome)
    }

    /// Deactivate every device except the kept one and invalidate every
    /// session not belonging to the kept device, in a single transaction.
    ///
    /// Returns `(devices_logged_out, sessions_invalidated)`. Matching
    /// sessions by device keeps the two tables consistent: a deactivated
    /// device never retains a valid session. Keeping a device the caller
    /// does not hold (including one not yet registered) is allowed and
    /// invalidates the caller's own session too; that is how a user at
    /// their device limit hands the slot to a new device.
    pub fn logout_others(&self, user_id: &str, keep_device_id: &str) -> StoreResult<(usize, usize)> {
        let write_txn = self.db.begin_write()?;
        let counts = {
            let mut devices = write_txn.open_table(DEVICES)?;

            let mut to_deactivate = Vec::new();
            for entry in devices.iter()? {
                let (key, value) = entry?;
                let device: StoredDevice = serde_json::from_slice(value.value())?;
                if device.user_id == user_id
                    && device.device_id != keep_device_id
                    && device.is_active
                {
                    to_deactivate.push((key.value().to_string(), device));
                }
            }
            for (key, device) in &mut to_deactivate {
                device.is_active = false;
                let json = serde_json::to_vec(device)?;
                devices.insert(key.as_str(), json.as_slice())?;
            }

            let mut sessions = write_txn.open_table(SESSIONS)?;

            let mut to_invalidate = Vec::new();
            for entry in sessions.iter()? {
                let (key, value) = entry?;
                let session: StoredSession = serde_json::from_slice(value.value())?;
                if session.user_id == user_id
                    && session.device_id != keep_device_id
                    && session.is_valid
                {
                    to_invalidate.push((key.value().to_string(), session));
                }
            }
            for (key, session) in &mut to_invalidate {
                session.is_valid = false;
                let json = serde_json::to_vec(session)?;
                sessions.insert(key.as_str(), json.as_slice())?;
            }

            (to_deactivate.len(), to_invalidate.len())
        };
        write_txn.commit()?;
        Ok(counts)
    }

    /// Current device status for a user, including the slot headroom.
    pub fn status(&self, user: &StoredUser) -> StoreResult<DeviceStatus> {
        let devices = self.list_for_user(&user.id)?;
        let active_count = devices.iter().filter(|d| d.is_active).count();
        let can_add_more =
            user.multi_device_enabled || active_count < user.max_devices as usize;

        Ok(DeviceStatus {
            devices,
            active_count,
            max_devices: user.max_devices,
            multi_device_enabled: user.multi_device_enabled,
            can_add_more,
        })
    }

    /// All devices registered to a user, newest activity first.
    pub fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<StoredDevice>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DEVICES)?;

        let mut devices = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let device: StoredDevice = serde_json::from_slice(value.value())?;
            if device.user_id == user_id {
                devices.push(device);
            }
        }
        devices.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        Ok(devices)
    }

    /// Look up a single device by identifier.
    pub fn get(&self, device_id: &str) -> StoreResult<Option<StoredDevice>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DEVICES)?;
        match table.get(device_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}

/// Active devices for a user, scanned within the caller's transaction so
/// the count and any following insert are atomic.
fn active_devices_for<T: ReadableTable<&'static str, &'static [u8]>>(
    table: &T,
    user_id: &str,
) -> StoreResult<Vec<StoredDevice>> {
    let mut active = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        let device: StoredDevice = serde_json::from_slice(value.value())?;
        if device.user_id == user_id && device.is_active {
            active.push(device);
        }
    }
    active.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
    Ok(active)
}
