//! Local server round trip over a real socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use sls_axum::app::ControllerRegistry;
use sls_axum::config::{AppConfig, RouteDescriptor};
use sls_axum::handlers::build_handlers;
use sls_axum::http::LocalServer;
use sls_axum::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

async fn start(config: AppConfig) -> (SocketAddr, Shutdown, JoinHandle<std::io::Result<()>>) {
    let config = Arc::new(config);
    let table = build_handlers(config.clone(), ControllerRegistry::builtin(), None).unwrap();
    let server = LocalServer::new(&config, &table).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    (addr, shutdown, handle)
}

fn config() -> AppConfig {
    AppConfig {
        routes: vec![
            RouteDescriptor::new("echo", "/echo/{name}").with_controller("echo"),
            RouteDescriptor::new("health", "/health"),
            RouteDescriptor::new("broken", "/broken").with_controller("does-not-exist"),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_round_trip_through_handler() {
    let (addr, shutdown, handle) = start(config()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/echo/alice?verbose=true"))
        .header("x-request-id", "local-1")
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-request-id"], "local-1");

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["route"], "echo");
    assert_eq!(body["method"], "POST");
    assert_eq!(body["path"], "/echo/alice");
    assert_eq!(body["query"], "verbose=true");
    assert_eq!(body["body"], "hello");

    let health: Value = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_failed_invocation_is_bad_gateway() {
    let (addr, shutdown, handle) = start(config()).await;

    let response = reqwest::get(format!("http://{addr}/broken")).await.unwrap();
    assert_eq!(response.status(), 502);
    let text = response.text().await.unwrap();
    assert!(text.contains("does-not-exist"), "{text}");

    let missing = reqwest::get(format!("http://{addr}/nowhere")).await.unwrap();
    assert_eq!(missing.status(), 404);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
