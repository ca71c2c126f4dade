use std::env;
use std::net::SocketAddr;

use pocket_tracker_relay::{router, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 3001;

fn load_port() -> u16 {
    match env::var("RELAY_PORT") {
        Ok(value) => value.parse().unwrap_or_else(|e| {
            warn!("Invalid RELAY_PORT value: {e}, using default {DEFAULT_PORT}");
            DEFAULT_PORT
        }),
        Err(_) => {
            info!("RELAY_PORT not set, using default: {DEFAULT_PORT}");
            DEFAULT_PORT
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = AppState {
        http_client: reqwest::Client::new(),
    };
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], load_port()));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind relay port");

    info!("image relay listening on {addr}");
    axum::serve(listener, app).await.expect("relay server failed");
}
