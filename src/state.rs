// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

use std::sync::Arc;

use crate::auth::TokenSigner;
use crate::storage::AuthDatabase;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<AuthDatabase>,
    pub tokens: Arc<TokenSigner>,
}

impl AppState {
    pub fn new(db: AuthDatabase, tokens: TokenSigner) -> Self {
        Self {
            db: Arc::new(db),
            tokens: Arc::new(tokens),
        }
    }
}
