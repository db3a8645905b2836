// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! Authentication endpoints: guest signup, login, refresh, validate,
//! logout.

use axum::{
    extract::State,
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    auth::{
        extractor::resolve_session,
        password::verify_password,
        tokens::{hash_token, IssuedTokens},
        Auth,
    },
    error::ApiError,
    models::{
        ApiSuccess, DeviceResponse, GuestSignupRequest, LoginData, LoginRequest, MessageData,
        RefreshData, RefreshRequest, TrialWarning, UserResponse, ValidateData,
    },
    state::AppState,
    storage::{
        AuditRepository, DeviceRegistration, DeviceRepository, SessionRepository,
        SettingsRepository, StoredDevice, StoredSession, StoredSettings, StoredUser, UserRepository,
        UserType,
    },
};

/// Client network metadata pulled from request headers.
pub(crate) struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

pub(crate) fn client_meta(headers: &HeaderMap) -> ClientMeta {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    ClientMeta {
        ip_address,
        user_agent,
    }
}

/// Issue a token pair and persist the matching session row.
///
/// Persisting is not optional: if the session cannot be written, no
/// tokens are handed out, so a token can never exist without a
/// revocable session behind it.
pub(crate) fn issue_session(
    state: &AppState,
    user: &StoredUser,
    device_id: &str,
    meta: &ClientMeta,
) -> Result<IssuedTokens, ApiError> {
    let now = Utc::now();
    let pair = state.tokens.issue_pair(&user.id, device_id, now)?;

    SessionRepository::new(&state.db).insert(&StoredSession {
        session_id: pair.session_id.clone(),
        user_id: user.id.clone(),
        device_id: device_id.to_string(),
        access_token_hash: hash_token(&pair.access_token),
        refresh_token_hash: hash_token(&pair.refresh_token),
        is_valid: true,
        expires_at: pair.refresh_expires_at,
        created_at: now,
        last_activity: now,
        ip_address: meta.ip_address.clone(),
        user_agent: meta.user_agent.clone(),
    })?;

    Ok(pair)
}

/// Audit writes never fail the request they describe.
pub(crate) fn record_audit(state: &AppState, user_id: &str, action: &str, meta: &ClientMeta) {
    if let Err(e) = AuditRepository::new(&state.db).record(
        user_id,
        action,
        meta.ip_address.as_deref(),
        meta.user_agent.as_deref(),
    ) {
        tracing::warn!(user_id, action, error = %e, "audit record failed");
    }
}

pub(crate) fn device_limit_error(current: Vec<StoredDevice>, max_devices: u32) -> ApiError {
    let devices: Vec<DeviceResponse> = current.iter().map(DeviceResponse::from).collect();
    ApiError::forbidden("Maximum device limit reached. Please logout from another device to continue.")
        .with_code("DEVICE_LIMIT_REACHED")
        .with_data(json!({
            "currentDevices": devices,
            "maxDevices": max_devices,
        }))
}

/// Register the login device, mapping the limit outcome to the wire error.
fn register_device(
    state: &AppState,
    user: &StoredUser,
    device_id: &str,
    device_name: Option<&str>,
    platform: Option<&str>,
) -> Result<(), ApiError> {
    match DeviceRepository::new(&state.db).register_or_reactivate(
        user,
        device_id,
        device_name,
        platform,
    )? {
        DeviceRegistration::Registered(_) | DeviceRegistration::Reactivated(_) => Ok(()),
        DeviceRegistration::LimitReached(current) => {
            Err(device_limit_error(current, user.max_devices))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/guest-signup",
    request_body = GuestSignupRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "Guest account created", body = LoginData),
        (status = 400, description = "Missing device id")
    )
)]
pub async fn guest_signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GuestSignupRequest>,
) -> Result<(StatusCode, Json<ApiSuccess<LoginData>>), ApiError> {
    if request.device_id.trim().is_empty() {
        return Err(ApiError::bad_request("Device ID is required"));
    }

    let now = Utc::now();
    let full_name = request
        .full_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "Guest User".to_string());

    let user = StoredUser::new_guest(full_name, now);
    UserRepository::new(&state.db).create(&user)?;
    SettingsRepository::new(&state.db).seed_defaults(&StoredSettings::defaults_for(&user, now))?;

    register_device(
        &state,
        &user,
        &request.device_id,
        request.device_name.as_deref(),
        request.platform.as_deref(),
    )?;

    let meta = client_meta(&headers);
    let pair = issue_session(&state, &user, &request.device_id, &meta)?;
    record_audit(&state, &user.id, "user_signup", &meta);

    tracing::info!(user_id = %user.id, "guest account created");

    Ok((
        StatusCode::CREATED,
        Json(ApiSuccess::new(LoginData {
            user: UserResponse::from(&user),
            token: pair.access_token,
            refresh_token: pair.refresh_token,
            session_id: pair.session_id,
            expires_at: pair.access_expires_at,
        })),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Logged in", body = LoginData),
        (status = 400, description = "Missing username, password, or device id"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Device limit reached (code DEVICE_LIMIT_REACHED)")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiSuccess<LoginData>>, ApiError> {
    if request.username.trim().is_empty() {
        return Err(ApiError::bad_request("Username is required"));
    }
    if request.device_id.trim().is_empty() {
        return Err(ApiError::bad_request("Device ID is required"));
    }

    let users = UserRepository::new(&state.db);
    let mut user = users
        .get_by_username(&request.username)?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    // Guests authenticate by device possession alone.
    if user.user_type != UserType::Guest {
        let password = request.password.as_deref().unwrap_or_default();
        if password.is_empty() {
            return Err(ApiError::bad_request("Password is required"));
        }
        let hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;
        if !verify_password(password, hash) {
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    }

    // Legacy rows may predate business grouping.
    if user.business_id.is_empty() {
        user.business_id = format!("biz_{}", user.id.replace('-', ""));
        user.updated_at = Utc::now();
        users.update(&user)?;
    }

    register_device(
        &state,
        &user,
        &request.device_id,
        request.device_name.as_deref(),
        request.platform.as_deref(),
    )?;

    let user = users.touch_last_login(&user.id)?;
    let meta = client_meta(&headers);
    let pair = issue_session(&state, &user, &request.device_id, &meta)?;
    record_audit(&state, &user.id, "login", &meta);

    Ok(Json(ApiSuccess::new(LoginData {
        user: UserResponse::from(&user),
        token: pair.access_token,
        refresh_token: pair.refresh_token,
        session_id: pair.session_id,
        expires_at: pair.access_expires_at,
    })))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "New token pair issued", body = RefreshData),
        (status = 400, description = "Missing refresh token"),
        (status = 401, description = "Invalid, expired, or revoked refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<ApiSuccess<RefreshData>>, ApiError> {
    if request.refresh_token.is_empty() {
        return Err(ApiError::bad_request("Refresh token required"));
    }

    let claims = state.tokens.verify_refresh(&request.refresh_token)?;
    let session = resolve_session(&state, claims)?;

    // Rotation: the old session dies with the exchange, so a stolen
    // refresh token stops working the moment the real client refreshes.
    SessionRepository::new(&state.db).invalidate(&session.session_id)?;

    let meta = client_meta(&headers);
    let pair = issue_session(&state, &session.user, &session.device_id, &meta)?;
    record_audit(&state, &session.user.id, "token_refresh", &meta);

    Ok(Json(ApiSuccess::new(RefreshData {
        token: pair.access_token,
        refresh_token: pair.refresh_token,
        session_id: pair.session_id,
        expires_at: pair.access_expires_at,
    })))
}

#[utoipa::path(
    get,
    path = "/api/auth/validate",
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid", body = ValidateData),
        (status = 401, description = "Invalid token or session"),
        (status = 403, description = "Trial expired (code TRIAL_EXPIRED)")
    ),
    security(("bearer_token" = []))
)]
pub async fn validate(
    Auth(session): Auth,
    warning: Option<Extension<TrialWarning>>,
) -> Json<ApiSuccess<ValidateData>> {
    Json(ApiSuccess::new(ValidateData {
        user: UserResponse::from(&session.user),
        trial_warning: warning.map(|Extension(w)| w),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Session invalidated", body = MessageData),
        (status = 401, description = "Invalid token")
    ),
    security(("bearer_token" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Auth(session): Auth,
) -> Result<Json<ApiSuccess<MessageData>>, ApiError> {
    // Idempotent: logging out an already-dead session is still a success.
    SessionRepository::new(&state.db).invalidate(&session.session_id)?;

    let meta = client_meta(&headers);
    record_audit(&state, &session.user.id, "logout", &meta);

    Ok(Json(ApiSuccess::new(MessageData {
        message: "Logged out successfully".to_string(),
    })))
}

// The api/mod.rs router tests exercise these handlers end to end over
// HTTP, envelope included; see also tests/auth_flows.rs.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenSigner;
    use crate::storage::AuthDatabase;
    use chrono::Duration;
    use tempfile::TempDir;

    fn test_state() -> (AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = AuthDatabase::open(&dir.path().join("test.redb")).unwrap();
        let tokens = TokenSigner::new("api-test-secret", Duration::days(7), Duration::days(30));
        (AppState::new(db, tokens), dir)
    }

    fn signup_request(device_id: &str) -> GuestSignupRequest {
        GuestSignupRequest {
            full_name: Some("Asha".to_string()),
            device_id: device_id.to_string(),
            device_name: Some("Pixel 9".to_string()),
            platform: Some("android".to_string()),
        }
    }

    #[tokio::test]
    async fn guest_signup_creates_account_and_session() {
        let (state, _dir) = test_state();

        let (status, Json(body)) = guest_signup(
            State(state.clone()),
            HeaderMap::new(),
            Json(signup_request("dev-1")),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert!(body.success);
        assert_eq!(body.data.user.full_name, "Asha");
        assert!(body.data.user.username.starts_with("guest_"));

        // Access token is immediately usable.
        let claims = state.tokens.verify_access(&body.data.token).unwrap();
        assert_eq!(claims.session_id, body.data.session_id);
        let session = SessionRepository::new(&state.db)
            .get(&claims.session_id)
            .unwrap()
            .unwrap();
        assert!(session.is_valid);
        assert_eq!(session.device_id, "dev-1");
        // Only hashes at rest.
        assert_ne!(session.access_token_hash, body.data.token);

        // Settings were seeded.
        let settings = SettingsRepository::new(&state.db)
            .get(&body.data.user.id)
            .unwrap()
            .unwrap();
        assert_eq!(settings.business_name, "Asha's Parking");
    }

    #[tokio::test]
    async fn guest_signup_requires_device_id() {
        let (state, _dir) = test_state();
        let mut request = signup_request("");
        request.device_id = " ".to_string();

        let result = guest_signup(State(state), HeaderMap::new(), Json(request)).await;
        assert_eq!(result.unwrap_err().status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn second_device_login_hits_the_limit() {
        let (state, _dir) = test_state();

        let (_, Json(body)) = guest_signup(
            State(state.clone()),
            HeaderMap::new(),
            Json(signup_request("dev-1")),
        )
        .await
        .unwrap();

        let login_request = LoginRequest {
            username: body.data.user.username.clone(),
            password: None,
            device_id: "dev-2".to_string(),
            device_name: None,
            platform: None,
        };
        let err = login(State(state), HeaderMap::new(), Json(login_request))
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, Some("DEVICE_LIMIT_REACHED"));
        let data = err.data.unwrap();
        assert_eq!(data["maxDevices"], 1);
        assert_eq!(data["currentDevices"][0]["deviceId"], "dev-1");
    }

    #[tokio::test]
    async fn same_device_login_reactivates() {
        let (state, _dir) = test_state();

        let (_, Json(body)) = guest_signup(
            State(state.clone()),
            HeaderMap::new(),
            Json(signup_request("dev-1")),
        )
        .await
        .unwrap();

        let login_request = LoginRequest {
            username: body.data.user.username.clone(),
            password: None,
            device_id: "dev-1".to_string(),
            device_name: None,
            platform: None,
        };
        let Json(login_body) = login(State(state), HeaderMap::new(), Json(login_request))
            .await
            .unwrap();
        assert!(login_body.success);
        assert_eq!(login_body.data.user.id, body.data.user.id);
    }

    #[tokio::test]
    async fn unknown_user_gets_generic_credentials_error() {
        let (state, _dir) = test_state();

        let login_request = LoginRequest {
            username: "nobody@lot.example".to_string(),
            password: Some("pw".to_string()),
            device_id: "dev-1".to_string(),
            device_name: None,
            platform: None,
        };
        let err = login(State(state), HeaderMap::new(), Json(login_request))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Invalid credentials");
    }

    #[tokio::test]
    async fn refresh_rotates_the_session() {
        let (state, _dir) = test_state();

        let (_, Json(body)) = guest_signup(
            State(state.clone()),
            HeaderMap::new(),
            Json(signup_request("dev-1")),
        )
        .await
        .unwrap();
        let old_access = body.data.token.clone();
        let old_refresh = body.data.refresh_token.clone();

        let Json(refreshed) = refresh(
            State(state.clone()),
            HeaderMap::new(),
            Json(RefreshRequest {
                refresh_token: old_refresh.clone(),
            }),
        )
        .await
        .unwrap();
        assert_ne!(refreshed.data.token, old_access);
        assert_ne!(refreshed.data.session_id, body.data.session_id);

        // The old pair's session is dead: replaying the old refresh fails.
        let err = refresh(
            State(state.clone()),
            HeaderMap::new(),
            Json(RefreshRequest {
                refresh_token: old_refresh,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, Some("SESSION_INVALID"));

        // The new pair works.
        state.tokens.verify_access(&refreshed.data.token).unwrap();
    }

    #[tokio::test]
    async fn access_token_rejected_by_refresh() {
        let (state, _dir) = test_state();

        let (_, Json(body)) = guest_signup(
            State(state.clone()),
            HeaderMap::new(),
            Json(signup_request("dev-1")),
        )
        .await
        .unwrap();

        let err = refresh(
            State(state),
            HeaderMap::new(),
            Json(RefreshRequest {
                refresh_token: body.data.token,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, Some("INVALID_TOKEN_TYPE"));
    }

    #[tokio::test]
    async fn audit_trail_records_signup() {
        let (state, _dir) = test_state();

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        headers.insert(USER_AGENT, "ParkEase/1.4".parse().unwrap());

        let (_, Json(body)) = guest_signup(State(state.clone()), headers, Json(signup_request("dev-1")))
            .await
            .unwrap();

        let entries = AuditRepository::new(&state.db)
            .list_for_user(&body.data.user.id)
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "user_signup");
        assert_eq!(entries[0].ip_address.as_deref(), Some("203.0.113.7"));
    }
}
