//! Shared test utilities for varlab-server integration tests

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use varlab_server::{AppState, ServerConfig, VariantLabServer};

/// Starts a server over an in-memory store, returns state and address
#[allow(dead_code)]
pub async fn create_test_server() -> (Arc<AppState>, SocketAddr) {
    let state = Arc::new(AppState::in_memory().await.unwrap());
    let addr = spawn_server(Arc::clone(&state)).await;
    (state, addr)
}

/// Spawns a server around the given state, returns bound address
pub async fn spawn_server(state: Arc<AppState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = VariantLabServer::new(ServerConfig::default(), state);

    tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    addr
}
