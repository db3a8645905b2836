// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::trial::trial_gate,
    models::{
        DeviceResponse, DeviceStatusData, GuestSignupRequest, LoginData, LoginRequest,
        LogoutOthersData, LogoutOthersRequest, MessageData, RefreshData, RefreshRequest,
        TrialWarning, UserResponse, ValidateData,
    },
    state::AppState,
    storage::{StaffRole, UserType},
};

pub mod auth;
pub mod devices;
pub mod health;

pub fn router(state: AppState) -> Router {
    // The trial gate authenticates and enforces trial expiry for guests.
    // Logout stays outside it: an expired guest can still log out.
    let gated_routes = Router::new()
        .route("/api/auth/validate", get(auth::validate))
        .route("/api/devices/logout-others", post(devices::logout_others))
        .route("/api/devices/status", get(devices::status))
        .layer(middleware::from_fn_with_state(state.clone(), trial_gate));

    let open_routes = Router::new()
        .route("/api/auth/guest-signup", post(auth::guest_signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .merge(gated_routes)
        .merge(open_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::guest_signup,
        auth::login,
        auth::refresh,
        auth::validate,
        auth::logout,
        devices::logout_others,
        devices::status,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            GuestSignupRequest,
            LoginRequest,
            RefreshRequest,
            UserResponse,
            DeviceResponse,
            LoginData,
            RefreshData,
            ValidateData,
            TrialWarning,
            DeviceStatusData,
            LogoutOthersRequest,
            LogoutOthersData,
            MessageData,
            UserType,
            StaffRole,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Signup, login, and session lifecycle"),
        (name = "Devices", description = "Device slots and remote logout"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenSigner;
    use crate::storage::AuthDatabase;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Duration;
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state() -> (AppState, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = AuthDatabase::open(&dir.path().join("test.redb")).unwrap();
        let tokens = TokenSigner::new("router-test-secret", Duration::days(7), Duration::days(30));
        (AppState::new(db, tokens), dir)
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = test_state();
        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn protected_route_rejects_anonymous_requests() {
        let (state, _dir) = test_state();
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/validate")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "NO_TOKEN");
    }

    #[tokio::test]
    async fn health_is_public() {
        let (state, _dir) = test_state();
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
