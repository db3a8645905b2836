// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! Stored entities for the auth database.
//!
//! These are the canonical internal representations. The HTTP layer maps
//! them to camelCase response shapes in `models.rs` at the boundary; no
//! runtime key-renaming happens anywhere else.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account kind. Only `Guest` accounts are subject to trial expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Auto-created account with a time-boxed trial window, no password.
    Guest,
    /// Paid account, no trial restrictions.
    Premium,
    /// Administrative account.
    Admin,
}

/// Staff role within a business group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    /// Business owner (full control, default for signups).
    Owner,
    /// Manager (can invite staff).
    Manager,
    /// Day-to-day operator.
    Operator,
}

/// User record stored in the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredUser {
    /// Unique user identifier (UUID).
    pub id: String,
    /// Login name, unique case-insensitively.
    pub username: String,
    /// Display name.
    pub full_name: String,
    /// Argon2 PHC hash. Absent for guest accounts.
    pub password_hash: Option<String>,
    pub user_type: UserType,
    pub role: StaffRole,
    /// Tenant-like grouping for multi-staff operation.
    pub business_id: String,
    /// Logical-delete flag. Deactivated users fail every auth check.
    pub is_active: bool,
    pub trial_starts_at: DateTime<Utc>,
    pub trial_expires_at: DateTime<Utc>,
    /// When true the max-device limit is not enforced.
    pub multi_device_enabled: bool,
    /// Maximum concurrently-active devices when multi-device is off.
    pub max_devices: u32,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trial window length for new guest accounts.
pub const TRIAL_DAYS: i64 = 3;

impl StoredUser {
    /// Build a fresh guest account with a 3-day trial window.
    ///
    /// Username and business id follow the legacy app conventions so
    /// existing mobile clients keep working.
    pub fn new_guest(full_name: String, now: DateTime<Utc>) -> Self {
        let millis = now.timestamp_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: format!("guest_{millis}@parkease.local"),
            full_name,
            password_hash: None,
            user_type: UserType::Guest,
            role: StaffRole::Owner,
            business_id: format!("biz_{millis}"),
            is_active: true,
            trial_starts_at: now,
            trial_expires_at: now + Duration::days(TRIAL_DAYS),
            multi_device_enabled: false,
            max_devices: 1,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Device record stored in the `devices` table.
///
/// A device belongs to exactly one user at a time; logging in with a known
/// device_id under a different account re-binds it to the new owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredDevice {
    /// Globally unique device identifier supplied by the client.
    pub device_id: String,
    /// Owning user.
    pub user_id: String,
    pub device_name: Option<String>,
    pub platform: Option<String>,
    /// Counts against the owner's device limit while true.
    pub is_active: bool,
    /// Set on the first device a user ever registers.
    pub is_primary: bool,
    pub last_active_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Session record stored in the `sessions` table.
///
/// One row per issued token pair. Both tokens are stored as one-way hashes,
/// never plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSession {
    /// Unique per issuance: `user:device:millis:random-suffix`.
    pub session_id: String,
    pub user_id: String,
    /// Device identifier, not a strict foreign key (the device row may
    /// predate session tracking).
    pub device_id: String,
    pub access_token_hash: String,
    pub refresh_token_hash: String,
    /// Cleared on logout; an invalid session is never revalidated.
    pub is_valid: bool,
    /// Matches the refresh token lifetime; the sweep deletes the row
    /// once this has passed.
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Touched on every authenticated request.
    pub last_activity: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Per-vehicle-type rate card entry seeded for new businesses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleRate {
    pub name: String,
    pub hourly_rate: u32,
    pub daily_rate: u32,
    pub monthly_rate: u32,
    pub minimum_charge: u32,
    pub free_minutes: u32,
}

/// Business settings stored in the `settings` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSettings {
    pub user_id: String,
    pub business_id: String,
    pub business_name: String,
    pub vehicle_types: Vec<VehicleRate>,
    pub created_at: DateTime<Utc>,
}

impl StoredSettings {
    /// Default rate card for a newly signed-up business.
    pub fn defaults_for(user: &StoredUser, now: DateTime<Utc>) -> Self {
        let rate = |name: &str, hourly, daily, monthly, minimum, free| VehicleRate {
            name: name.to_string(),
            hourly_rate: hourly,
            daily_rate: daily,
            monthly_rate: monthly,
            minimum_charge: minimum,
            free_minutes: free,
        };
        Self {
            user_id: user.id.clone(),
            business_id: user.business_id.clone(),
            business_name: format!("{}'s Parking", user.full_name),
            vehicle_types: vec![
                rate("Car", 20, 200, 5000, 20, 15),
                rate("Bike", 10, 100, 2500, 10, 10),
                rate("Scooter", 10, 100, 2500, 10, 10),
                rate("SUV", 30, 300, 7500, 30, 15),
            ],
            created_at: now,
        }
    }
}

/// One row of the append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub user_id: String,
    /// e.g. "user_signup", "login", "logout", "logout_others".
    pub action: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}
