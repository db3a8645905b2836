// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 ParkEase

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parkease_server::api::router;
use parkease_server::auth::TokenSigner;
use parkease_server::config::{Config, LOG_FORMAT_ENV};
use parkease_server::state::AppState;
use parkease_server::storage::AuthDatabase;
use parkease_server::sweeper::SessionSweeper;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v == "json")
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("configuration error: {e}");
        std::process::exit(1);
    });

    std::fs::create_dir_all(&config.data_dir).expect("Failed to create data directory");
    let db = AuthDatabase::open(&config.data_dir.join("auth.redb"))
        .expect("Failed to open auth database");

    let signer = TokenSigner::new(&config.jwt_secret, config.access_ttl, config.refresh_ttl);
    let state = AppState::new(db, signer);

    let shutdown = CancellationToken::new();
    let sweeper = SessionSweeper::new(Arc::clone(&state.db));
    tokio::spawn(sweeper.run(shutdown.clone()));

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    info!(%addr, "ParkEase server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .expect("Server failed");
}

async fn shutdown_signal(token: CancellationToken) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
    info!("shutdown signal received");
    token.cancel();
}
