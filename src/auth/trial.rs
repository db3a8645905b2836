// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! Trial enforcement for guest accounts.
//!
//! Guests get a 3-day window. Past it, gated endpoints return
//! `TRIAL_EXPIRED`; inside the final 24 hours they still work but carry
//! a warning. Premium and admin accounts are never gated.
//!
//! The gate sits on protected route subtrees as middleware. Logout is
//! deliberately not gated: an expired guest must still be able to log out.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use super::extractor::Auth;
use super::AuthError;
use crate::models::TrialWarning;
use crate::state::AppState;
use crate::storage::{StoredUser, UserType};

/// Evaluate a user's trial state.
///
/// Returns a warning when less than 24 hours remain, an error when the
/// trial has lapsed, and `Ok(None)` for everyone else.
pub fn check_trial(
    user: &StoredUser,
    now: DateTime<Utc>,
) -> Result<Option<TrialWarning>, AuthError> {
    if user.user_type != UserType::Guest {
        return Ok(None);
    }

    if now > user.trial_expires_at {
        // Whole days elapsed since expiry; partial days do not count.
        let days_expired = (now - user.trial_expires_at).num_days();
        return Err(AuthError::TrialExpired { days_expired });
    }

    let hours_remaining = (user.trial_expires_at - now).num_hours();
    if hours_remaining < 24 {
        return Ok(Some(TrialWarning {
            message: "Your trial expires in less than 24 hours".to_string(),
            hours_remaining,
            expires_at: user.trial_expires_at,
        }));
    }

    Ok(None)
}

/// Middleware enforcing the trial gate on a router subtree.
///
/// Authenticates the request, applies the trial check to the resolved
/// user, and stores the session (plus any warning) in request extensions
/// for the handler's `Auth` extractor to pick up.
pub async fn trial_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let session = match Auth::from_request_parts(&mut parts, &state).await {
        Ok(Auth(session)) => session,
        Err(e) => return e.into_response(),
    };

    match check_trial(&session.user, Utc::now()) {
        Ok(warning) => {
            parts.extensions.insert(session);
            if let Some(warning) = warning {
                parts.extensions.insert(warning);
            }
            next.run(Request::from_parts(parts, body)).await
        }
        Err(e) => e.into_response(),
    }
}
