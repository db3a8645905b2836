// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! Axum extractor for authenticated sessions.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(session): Auth) -> impl IntoResponse {
//!     // session is AuthenticatedSession
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;

use super::claims::TokenClaims;
use super::{AuthError, AuthenticatedSession};
use crate::state::AppState;
use crate::storage::{SessionRepository, UserRepository};

/// Extractor for authenticated sessions.
///
/// Verifies the bearer access token, then checks the session row it
/// names. A syntactically valid JWT whose session has been invalidated
/// is rejected: logout is final even while the token itself is unexpired.
pub struct Auth(pub AuthenticatedSession);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // First check if middleware already resolved the session
        if let Some(session) = parts.extensions.get::<AuthenticatedSession>().cloned() {
            return Ok(Auth(session));
        }

        let token = bearer_token(parts)?;
        let claims = state.tokens.verify_access(token)?;
        let session = resolve_session(state, claims)?;

        Ok(Auth(session))
    }
}

/// Pull the bearer token out of the Authorization header.
pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidToken)
}

/// Check verified claims against the session and user rows.
///
/// Shared between the access-token path here and the refresh exchange,
/// which verifies a refresh token and then applies the same checks.
pub(crate) fn resolve_session(
    state: &AppState,
    claims: TokenClaims,
) -> Result<AuthenticatedSession, AuthError> {
    let sessions = SessionRepository::new(&state.db);
    let session = sessions
        .get(&claims.session_id)
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .ok_or(AuthError::SessionInvalid)?;

    if !session.is_valid || session.expires_at <= Utc::now() {
        return Err(AuthError::SessionInvalid);
    }

    let user = UserRepository::new(&state.db)
        .get(&claims.sub)
        .map_err(|e| AuthError::Internal(e.to_string()))?
        .ok_or(AuthError::UserNotFound)?;

    if !user.is_active {
        return Err(AuthError::AccountDeactivated);
    }

    // Best effort; a failed activity stamp must not reject the request.
    if let Err(e) = sessions.touch(&claims.session_id) {
        tracing::warn!(
            session_id = %claims.session_id,
            error = %e,
            "failed to update session activity"
        );
    }

    Ok(AuthenticatedSession {
        user,
        session_id: claims.session_id,
        device_id: claims.device_id,
    })
}
