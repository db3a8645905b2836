// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! # Auth Storage Module
//!
//! Persistent storage for users, devices, and sessions, backed by an
//! embedded redb database (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! ```text
//! auth.redb
//!   users       user_id → StoredUser
//!   usernames   lowercase username → user_id
//!   devices     device_id → StoredDevice
//!   sessions    session_id → StoredSession
//!   settings    user_id → StoredSettings
//!   audit_log   sequence → AuditEntry
//! ```
//!
//! ## Important Notes
//!
//! - The database is the sole authority for session validity. There is
//!   no in-process session cache, so a restart never loses sessions.
//! - Device-limit checks and the corresponding inserts happen inside a
//!   single write transaction; two racing logins cannot both pass the
//!   limit check.

pub mod db;
pub mod models;
pub mod repository;

pub use db::{AuthDatabase, StoreError, StoreResult};
pub use models::{
    AuditEntry, StaffRole, StoredDevice, StoredSession, StoredSettings, StoredUser, UserType,
    VehicleRate, TRIAL_DAYS,
};
pub use repository::{
    AuditRepository, DeviceRegistration, DeviceRepository, DeviceStatus, SessionRepository,
    SettingsRepository, UserRepository, INVALID_RETENTION_DAYS,
};
