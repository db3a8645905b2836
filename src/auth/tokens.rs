// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! Token issuance and verification.
//!
//! Every login produces one session with two HS256 JWTs: a short-lived
//! access token and a longer-lived refresh token. Both carry the same
//! `session_id`, which ties them to a single revocable session row.

use base64ct::{Base64Unpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};

use super::claims::{TokenClaims, TokenType};
use super::AuthError;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// A freshly issued token pair and its session identifier.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub session_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry; also the session row expiry.
    pub refresh_expires_at: DateTime<Utc>,
}

/// Signs and verifies ParkEase JWTs with a single shared secret.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue an access/refresh pair bound to a new session id.
    pub fn issue_pair(
        &self,
        user_id: &str,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedTokens, AuthError> {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let session_id = format!(
            "{user_id}:{device_id}:{}:{}",
            now.timestamp_millis(),
            &suffix[..8]
        );

        let access_expires_at = now + self.access_ttl;
        let refresh_expires_at = now + self.refresh_ttl;

        let access_token = self.sign(TokenClaims {
            sub: user_id.to_string(),
            device_id: device_id.to_string(),
            session_id: session_id.clone(),
            token_type: TokenType::Access,
            iat: now.timestamp(),
            exp: access_expires_at.timestamp(),
        })?;
        let refresh_token = self.sign(TokenClaims {
            sub: user_id.to_string(),
            device_id: device_id.to_string(),
            session_id: session_id.clone(),
            token_type: TokenType::Refresh,
            iat: now.timestamp(),
            exp: refresh_expires_at.timestamp(),
        })?;

        Ok(IssuedTokens {
            session_id,
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    fn sign(&self, claims: TokenClaims) -> Result<String, AuthError> {
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;
        Ok(data.claims)
    }

    /// Verify a token that must be an access token.
    pub fn verify_access(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.verify(token)?;
        if claims.token_type != TokenType::Access {
            return Err(AuthError::WrongTokenType);
        }
        Ok(claims)
    }

    /// Verify a token that must be a refresh token.
    pub fn verify_refresh(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims = self.verify(token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::WrongTokenType);
        }
        Ok(claims)
    }
}

/// One-way hash of a token for at-rest storage.
///
/// Session rows never hold token plaintext; a database leak must not
/// leak usable credentials.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    Base64Unpadded::encode_string(&digest)
}
