// src/main.rs
mod config;
mod database;
mod dtos;
mod error;
mod handlers;
mod models;
mod routes;
mod state;


use std::net::{IpAddr, SocketAddr};

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

// Extra ports tried after PORT when it is already taken.
const PORT_FALLBACK_ATTEMPTS: u16 = 20;

#[tokio::main]
async fn main() {
    // Load environment variables before the log filter reads RUST_LOG
    dotenv().ok();

    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return;
        }
    };

    let db = match database::connect(&config.database_url, config.max_connections).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open database");
            return;
        }
    };

    let app_state = state::AppState::new(db);
    let app = routes::build_app(app_state, config.base_path.as_deref());

    let Some((listener, addr)) = bind_listener(config.host, config.port).await else {
        tracing::error!(
            "Failed to bind to any port starting at {} on {}",
            config.port,
            config.host
        );
        return;
    };
    tracing::info!("Server running on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// Try base_port..=base_port+PORT_FALLBACK_ATTEMPTS to avoid crashing when the address is in use
async fn bind_listener(host: IpAddr, base_port: u16) -> Option<(TcpListener, SocketAddr)> {
    for offset in 0..=PORT_FALLBACK_ATTEMPTS {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::from((host, port));
        match TcpListener::bind(addr).await {
            Ok(listener) => return Some((listener, addr)),
            Err(e) => {
                if offset == 0 {
                    tracing::warn!(%addr, error = %e, "Port in use, trying next");
                }
            }
        }
    }
    None
}
