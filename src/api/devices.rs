// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! Device management endpoints.

use axum::{extract::State, http::HeaderMap, Json};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{ApiSuccess, DeviceResponse, DeviceStatusData, LogoutOthersData, LogoutOthersRequest},
    state::AppState,
    storage::DeviceRepository,
};

use super::auth::{client_meta, record_audit};

#[utoipa::path(
    post,
    path = "/api/devices/logout-others",
    tag = "Devices",
    request_body = LogoutOthersRequest,
    responses(
        (status = 200, description = "Other devices logged out", body = LogoutOthersData),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Trial expired (code TRIAL_EXPIRED)")
    ),
    security(("bearer_token" = []))
)]
pub async fn logout_others(
    State(state): State<AppState>,
    headers: HeaderMap,
    Auth(session): Auth,
    body: Option<Json<LogoutOthersRequest>>,
) -> Result<Json<ApiSuccess<LogoutOthersData>>, ApiError> {
    let keep_device_id = body
        .and_then(|Json(request)| request.device_id)
        .unwrap_or_else(|| session.device_id.clone());

    let (devices_logged_out, sessions_invalidated) =
        DeviceRepository::new(&state.db).logout_others(&session.user.id, &keep_device_id)?;

    tracing::info!(
        user_id = %session.user.id,
        keep_device_id = %keep_device_id,
        devices_logged_out,
        sessions_invalidated,
        "logged out other devices"
    );

    let meta = client_meta(&headers);
    record_audit(&state, &session.user.id, "logout_others", &meta);

    Ok(Json(ApiSuccess::new(LogoutOthersData {
        devices_logged_out,
        sessions_invalidated,
    })))
}

#[utoipa::path(
    get,
    path = "/api/devices/status",
    tag = "Devices",
    responses(
        (status = 200, description = "Device slots for the caller", body = DeviceStatusData),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Trial expired (code TRIAL_EXPIRED)")
    ),
    security(("bearer_token" = []))
)]
pub async fn status(
    State(state): State<AppState>,
    Auth(session): Auth,
) -> Result<Json<ApiSuccess<DeviceStatusData>>, ApiError> {
    let status = DeviceRepository::new(&state.db).status(&session.user)?;

    Ok(Json(ApiSuccess::new(DeviceStatusData {
        devices: status.devices.iter().map(DeviceResponse::from).collect(),
        active_devices: status.active_count,
        max_devices: status.max_devices,
        multi_device_enabled: status.multi_device_enabled,
        can_add_more: status.can_add_more,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedSession, TokenSigner};
    use crate::storage::{AuthDatabase, DeviceRegistration, StoredUser, UserRepository};
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn test_state() -> (AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = AuthDatabase::open(&dir.path().join("test.redb")).unwrap();
        let tokens = TokenSigner::new("devices-test-secret", Duration::days(7), Duration::days(30));
        (AppState::new(db, tokens), dir)
    }

    fn seed_user_with_devices(state: &AppState, device_ids: &[&str]) -> StoredUser {
        let mut user = StoredUser::new_guest("Tester".to_string(), Utc::now());
        user.multi_device_enabled = true;
        UserRepository::new(&state.db).create(&user).unwrap();

        let devices = DeviceRepository::new(&state.db);
        for id in device_ids {
            let outcome = devices
                .register_or_reactivate(&user, id, None, None)
                .unwrap();
            assert!(matches!(outcome, DeviceRegistration::Registered(_)));
        }
        user
    }

    fn session_for(user: &StoredUser, device_id: &str) -> AuthenticatedSession {
        AuthenticatedSession {
            user: user.clone(),
            session_id: format!("sess-{device_id}"),
            device_id: device_id.to_string(),
        }
    }

    #[tokio::test]
    async fn status_reports_slots() {
        let (state, _dir) = test_state();
        let user = seed_user_with_devices(&state, &["dev-a", "dev-b"]);

        let Json(body) = status(State(state), Auth(session_for(&user, "dev-a")))
            .await
            .unwrap();

        assert!(body.success);
        assert_eq!(body.data.active_devices, 2);
        assert_eq!(body.data.devices.len(), 2);
        assert!(body.data.multi_device_enabled);
        assert!(body.data.can_add_more);
    }

    #[tokio::test]
    async fn logout_others_keeps_calling_device() {
        let (state, _dir) = test_state();
        let user = seed_user_with_devices(&state, &["dev-a", "dev-b", "dev-c"]);

        let Json(body) = logout_others(
            State(state.clone()),
            HeaderMap::new(),
            Auth(session_for(&user, "dev-a")),
            None,
        )
        .await
        .unwrap();

        assert_eq!(body.data.devices_logged_out, 2);

        let Json(status_body) = status(State(state), Auth(session_for(&user, "dev-a")))
            .await
            .unwrap();
        assert_eq!(status_body.data.active_devices, 1);
        let active: Vec<_> = status_body
            .data
            .devices
            .iter()
            .filter(|d| d.is_active)
            .collect();
        assert_eq!(active[0].device_id, "dev-a");
    }

    #[tokio::test]
    async fn logout_others_honors_named_keep_device() {
        let (state, _dir) = test_state();
        let user = seed_user_with_devices(&state, &["dev-a", "dev-b"]);

        let Json(body) = logout_others(
            State(state.clone()),
            HeaderMap::new(),
            Auth(session_for(&user, "dev-a")),
            Some(Json(LogoutOthersRequest {
                device_id: Some("dev-b".to_string()),
            })),
        )
        .await
        .unwrap();

        assert_eq!(body.data.devices_logged_out, 1);

        let Json(status_body) = status(State(state), Auth(session_for(&user, "dev-b")))
            .await
            .unwrap();
        let active: Vec<_> = status_body
            .data
            .devices
            .iter()
            .filter(|d| d.is_active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].device_id, "dev-b");
    }
}
