// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! API request and response types.
//!
//! The wire format is camelCase to match the mobile app. Successful
//! responses are wrapped in `{ "success": true, "data": ... }`; the
//! error half of the envelope lives in `error.rs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{StaffRole, StoredDevice, StoredUser, UserType};

/// Success envelope wrapper.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiSuccess<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Request body for guest signup.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuestSignupRequest {
    /// Display name; defaults to "Guest User" when absent.
    pub full_name: Option<String>,
    /// Client-generated stable device identifier.
    pub device_id: String,
    pub device_name: Option<String>,
    pub platform: Option<String>,
}

/// Request body for username/password login.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    /// Absent for guest logins; guests authenticate by device possession.
    pub password: Option<String>,
    pub device_id: String,
    pub device_name: Option<String>,
    pub platform: Option<String>,
}

/// Request body for the refresh exchange.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Public view of a user account.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub user_type: UserType,
    pub role: StaffRole,
    pub business_id: String,
    pub trial_expires_at: DateTime<Utc>,
    pub multi_device_enabled: bool,
    pub max_devices: u32,
    pub created_at: DateTime<Utc>,
}

impl From<&StoredUser> for UserResponse {
    fn from(user: &StoredUser) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            user_type: user.user_type,
            role: user.role,
            business_id: user.business_id.clone(),
            trial_expires_at: user.trial_expires_at,
            multi_device_enabled: user.multi_device_enabled,
            max_devices: user.max_devices,
            created_at: user.created_at,
        }
    }
}

/// Public view of a registered device.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub device_id: String,
    pub device_name: Option<String>,
    pub platform: Option<String>,
    pub is_active: bool,
    pub is_primary: bool,
    pub last_active_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&StoredDevice> for DeviceResponse {
    fn from(device: &StoredDevice) -> Self {
        Self {
            device_id: device.device_id.clone(),
            device_name: device.device_name.clone(),
            platform: device.platform.clone(),
            is_active: device.is_active,
            is_primary: device.is_primary,
            last_active_at: device.last_active_at,
            created_at: device.created_at,
        }
    }
}

/// Payload returned by guest signup and login.
///
/// The access token is serialized as `token`; that is the name the
/// mobile app has always read.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
    pub session_id: String,
    /// Access token expiry.
    pub expires_at: DateTime<Utc>,
}

/// Payload returned by the refresh exchange.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshData {
    pub token: String,
    pub refresh_token: String,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Warning attached to responses while a guest trial is about to lapse.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrialWarning {
    pub message: String,
    pub hours_remaining: i64,
    pub expires_at: DateTime<Utc>,
}

/// Payload returned by token validation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateData {
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_warning: Option<TrialWarning>,
}

/// Request body for logging out other devices.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutOthersRequest {
    /// Device to keep. Defaults to the caller's device; naming a device
    /// that is not the caller's frees every slot, the caller's included,
    /// so a blocked new device can log in next.
    pub device_id: Option<String>,
}

/// Payload returned by the device status endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusData {
    pub devices: Vec<DeviceResponse>,
    pub active_devices: usize,
    pub max_devices: u32,
    pub multi_device_enabled: bool,
    pub can_add_more: bool,
}

/// Payload returned after logging out other devices.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutOthersData {
    pub devices_logged_out: usize,
    pub sessions_invalidated: usize,
}

/// Generic message payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageData {
    pub message: String,
}
