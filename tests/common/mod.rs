//! Shared utilities for integration tests.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use waypost::http::server;
use waypost::{Registry, Service};

/// Serve a registry on an ephemeral port and hand back the bound
/// address for clients.
pub async fn spawn_registry(registry: Registry) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server::serve(listener, registry).await;
    });
    addr
}

/// Single-service shorthand for [`spawn_registry`].
#[allow(dead_code)]
pub async fn spawn_service(service: Service) -> SocketAddr {
    let mut registry = Registry::new();
    registry.register(service).unwrap();
    spawn_registry(registry).await
}

/// Non-pooled client so each test request opens a fresh connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
