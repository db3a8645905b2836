// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! # Authentication Module
//!
//! Token-based authentication for the ParkEase API.
//!
//! ## Auth Flow
//!
//! 1. Client signs up (guest) or logs in, naming its device
//! 2. Server issues an HS256 access/refresh token pair bound to a new
//!    session row
//! 3. Client sends `Authorization: Bearer <access token>`
//! 4. Server verifies signature and expiry, then checks the session row:
//!    an invalidated session rejects even a cryptographically valid token
//!
//! ## Security
//!
//! - The signing secret comes from `JWT_SECRET`; there is no default
//! - Session rows store token hashes, never plaintext
//! - Refresh tokens are accepted only by the refresh endpoint
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod password;
pub mod tokens;
pub mod trial;

pub use claims::{AuthenticatedSession, TokenClaims, TokenType};
pub use error::AuthError;
pub use extractor::Auth;
pub use tokens::{IssuedTokens, TokenSigner};
