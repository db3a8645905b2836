// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! Repository layer providing typed access to the auth database.
//!
//! Each repository covers one entity, using the shared `AuthDatabase`
//! for all table operations.

pub mod audit;
pub mod devices;
pub mod sessions;
pub mod settings;
pub mod users;

pub use audit::AuditRepository;
pub use devices::{DeviceRegistration, DeviceRepository, DeviceStatus};
pub use sessions::{SessionRepository, INVALID_RETENTION_DAYS};
pub use settings::SettingsRepository;
pub use users::UserRepository;
