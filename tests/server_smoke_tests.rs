//! Smoke tests against a real listener.

use std::net::SocketAddr;

use prodguard::{api::create_router, AppState, Config};
use serde_json::{json, Value};

async fn spawn_server(config: Config) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = create_router(AppState::from_config(&config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });
    (addr, server)
}

#[tokio::test]
async fn test_server_serves_health_and_stats() {
    let (addr, server) = spawn_server(Config::default()).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");

    let response = client
        .get(format!("http://{}/api/cache/stats", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let stats: Value = response.json().await.unwrap();
    assert_eq!(stats["total_items"], 0);

    server.abort();
}

#[tokio::test]
async fn test_untrusted_forwarded_for_cannot_dodge_rate_limit() {
    let config = Config {
        trust_forwarded_for: false,
        ..Config::default()
    };
    let (addr, server) = spawn_server(config).await;
    let client = reqwest::Client::new();

    let mut statuses = Vec::new();
    for i in 0..6 {
        let response = client
            .post(format!("http://{}/api/auth/login", addr))
            .header("x-forwarded-for", format!("203.0.113.{i}"))
            .json(&json!({"email": format!("user{i}@corp.com"), "success": true}))
            .send()
            .await
            .unwrap();
        statuses.push(response.status());
    }

    // Every request is keyed by the peer address, 127.0.0.1
    assert!(statuses[..5].iter().all(|s| *s == reqwest::StatusCode::OK));
    assert_eq!(statuses[5], reqwest::StatusCode::TOO_MANY_REQUESTS);

    server.abort();
}
