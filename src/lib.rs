// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

//! ParkEase Server - Parking Business Backend
//!
//! Authentication and session backend for the ParkEase mobile app:
//! guest trials, device-limited logins, and revocable token sessions.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token issuance, verification, and trial gating
//! - `storage` - Embedded auth database (redb)
//! - `sweeper` - Background pruning of dead sessions

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod sweeper;
