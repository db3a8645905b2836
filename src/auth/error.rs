// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! Authentication errors.
//!
//! Every variant maps to a stable machine-readable code in the response
//! body. Mobile clients branch on these codes, so they must not change.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Authentication error type.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingToken,
    /// Token failed verification (bad header, bad signature, malformed)
    InvalidToken,
    /// A refresh token was presented where an access token is required,
    /// or the other way around
    WrongTokenType,
    /// Token has expired
    TokenExpired,
    /// Session row missing, invalidated, or past expiry
    SessionInvalid,
    /// Guest trial window has ended
    TrialExpired { days_expired: i64 },
    /// User row carries the deactivated flag
    AccountDeactivated,
    /// Token subject no longer exists
    UserNotFound,
    /// Storage or signing failure
    Internal(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "NO_TOKEN",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::WrongTokenType => "INVALID_TOKEN_TYPE",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::SessionInvalid => "SESSION_INVALID",
            AuthError::TrialExpired { .. } => "TRIAL_EXPIRED",
            AuthError::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::WrongTokenType
            | AuthError::TokenExpired
            | AuthError::SessionInvalid
            | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
            AuthError::TrialExpired { .. } | AuthError::AccountDeactivated => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "No token provided"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::WrongTokenType => write!(f, "Invalid token type"),
            AuthError::TokenExpired => write!(f, "Token expired"),
            AuthError::SessionInvalid => {
                write!(f, "Session has been invalidated. Please login again.")
            }
            AuthError::TrialExpired { days_expired } => {
                write!(
                    f,
                    "Your free trial has expired ({days_expired} day(s) ago). Please upgrade to continue."
                )
            }
            AuthError::AccountDeactivated => write!(f, "Account has been deactivated"),
            AuthError::UserNotFound => write!(f, "User not found"),
            AuthError::Internal(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = json!({
            "success": false,
            "error": self.to_string(),
            "code": self.error_code(),
        });
        if let AuthError::TrialExpired { days_expired } = &self {
            body["data"] = json!({ "daysExpired": days_expired });
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_token_returns_401_no_token() {
        let response = AuthError::MissingToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NO_TOKEN");
    }

    #[tokio::test]
    async fn trial_expired_returns_403_with_days() {
        let response = AuthError::TrialExpired { days_expired: 2 }.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["code"], "TRIAL_EXPIRED");
        assert_eq!(body["data"]["daysExpired"], 2);
    }

    #[tokio::test]
    async fn session_invalid_returns_401() {
        let response = AuthError::SessionInvalid.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
