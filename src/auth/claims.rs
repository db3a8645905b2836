// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! JWT claims and the authenticated session representation.

use serde::{Deserialize, Serialize};

use crate::storage::StoredUser;

/// Which half of a token pair a JWT represents.
///
/// Access tokens authenticate API requests; refresh tokens are only
/// accepted by the refresh endpoint. The two are never interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims carried in every ParkEase JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Device the token pair was issued to
    pub device_id: String,

    /// Server-side session row this token belongs to
    pub session_id: String,

    /// Access or refresh
    pub token_type: TokenType,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,
}

/// Authenticated session information resolved from a bearer token.
///
/// This is the primary type used throughout the application to represent
/// the authenticated caller. It is only constructed after the session row
/// has been checked for validity, so holding one implies a live session.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    /// Full user record, freshly loaded from storage.
    pub user: StoredUser,

    /// Session row id from the token claims.
    pub session_id: String,

    /// Device id from the token claims.
    pub device_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TokenType::Access).unwrap(),
            "\"access\""
        );
        assert_eq!(
            serde_json::to_string(&TokenType::Refresh).unwrap(),
            "\"refresh\""
        );
    }

    #[test]
    fn claims_round_trip() {
        let claims = TokenClaims {
            sub: "user-1".to_string(),
            device_id: "dev-1".to_string(),
            session_id: "user-1:dev-1:1700000000000:abcd1234".to_string(),
            token_type: TokenType::Refresh,
            iat: 1_700_000_000,
            exp: 1_702_592_000,
        };

        let json = serde_json::to_string(&claims).unwrap();
        let parsed: TokenClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.sub, claims.sub);
        assert_eq!(parsed.token_type, TokenType::Refresh);
    }
}
