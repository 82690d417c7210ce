//! Integration tests for OfflineMiddleware and ClientUpstream using wiremock.

use std::sync::Arc;

use offsync::{ActionQueue, Config, Connectivity, Dispatcher, NewAction, SyncStatus, WorkerState};
use offsync_backend::MemoryStorage;
use offsync_moka::MokaBackend;
use offsync_reqwest::{ClientUpstream, OfflineMiddleware};
use pretty_assertions::assert_eq;
use reqwest::{Client, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Nothing listens here; requests to it fail like an unreachable network.
/// Cache keys ignore the origin, so paths requested here hit entries
/// stored from the mock server.
const UNREACHABLE: &str = "http://127.0.0.1:1";

fn config() -> Config {
    Config::builder()
        .static_assets(["/static/js/bundle.js"])
        .app_shell(["/", "/products"])
        .build()
        .unwrap()
}

async fn serve_everything(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("page"))
        .mount(server)
        .await;
}

async fn activated(server: &MockServer) -> Dispatcher<MokaBackend> {
    let backend = MokaBackend::builder().max_entries(100).build();
    let dispatcher = Dispatcher::new(backend, config()).unwrap();
    let mut origin = ClientUpstream::new(Client::new(), server.uri().parse().unwrap());
    dispatcher.install(&mut origin).await.unwrap();
    assert_eq!(dispatcher.state(), WorkerState::Activated);
    dispatcher
}

async fn json_body(response: reqwest::Response) -> serde_json::Value {
    serde_json::from_str(&response.text().await.unwrap()).unwrap()
}

fn client(dispatcher: Dispatcher<MokaBackend>) -> ClientWithMiddleware {
    ClientBuilder::new(Client::new())
        .with(OfflineMiddleware::new(dispatcher))
        .build()
}

#[tokio::test]
async fn api_response_is_served_from_cache_when_origin_is_gone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&server)
        .await;
    serve_everything(&server).await;
    let dispatcher = activated(&server).await;
    let client = client(dispatcher);
    let online = client
        .get(format!("{}/api/products", server.uri()))
        .send()
        .await
        .unwrap();
    assert_eq!(online.status(), StatusCode::OK);
    assert_eq!(online.headers()["x-offsync-source"], "NETWORK");
    assert_eq!(json_body(online).await, json!([{ "id": 1 }]));

    let offline = client
        .get(format!("{UNREACHABLE}/api/products"))
        .send()
        .await
        .unwrap();
    assert_eq!(offline.status(), StatusCode::OK);
    assert_eq!(offline.headers()["x-offsync-source"], "CACHE");
    assert_eq!(json_body(offline).await, json!([{ "id": 1 }]));
}

#[tokio::test]
async fn offline_api_miss_is_a_json_503() {
    let server = MockServer::start().await;
    serve_everything(&server).await;
    let dispatcher = activated(&server).await;
    let client = client(dispatcher);
    let response = client
        .get(format!("{UNREACHABLE}/api/orders"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["x-offsync-source"], "SYNTHETIC");
    assert_eq!(
        json_body(response).await,
        json!({ "error": "network unavailable", "offline": true })
    );
}

#[tokio::test]
async fn app_shell_is_served_for_unknown_pages_offline() {
    let server = MockServer::start().await;
    serve_everything(&server).await;
    let dispatcher = activated(&server).await;
    let client = client(dispatcher);
    let response = client
        .get(format!("{UNREACHABLE}/orders/7"))
        .header("accept", "text/html")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-offsync-source"], "CACHE");
    assert_eq!(response.text().await.unwrap(), "page");
}

#[tokio::test]
async fn post_requests_are_not_intercepted() {
    let server = MockServer::start().await;
    serve_everything(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let dispatcher = activated(&server).await;
    let client = client(dispatcher);

    let response = client
        .post(format!("{}/api/products", server.uri()))
        .header("content-type", "application/json")
        .body(json!({ "name": "Lamp" }).to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().get("x-offsync-source").is_none());
}

#[tokio::test]
async fn install_fails_when_manifest_entry_is_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/static/js/bundle.js"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let backend = MokaBackend::builder().max_entries(100).build();
    let dispatcher = Dispatcher::new(backend, config()).unwrap();
    let mut origin = ClientUpstream::new(Client::new(), server.uri().parse().unwrap());

    assert!(dispatcher.install(&mut origin).await.is_err());
    assert_eq!(dispatcher.state(), WorkerState::Redundant);
}

#[tokio::test]
async fn queued_action_is_replayed_with_token_and_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/products"))
        .and(header("authorization", "Bearer t0ken"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "name": "X" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let connectivity = Connectivity::new(true);
    let queue = ActionQueue::load(storage, connectivity, &Config::default()).await;
    queue.tokens().set("t0ken").await.unwrap();
    queue
        .enqueue(NewAction::post("/api/products", json!({ "name": "X" })))
        .await
        .unwrap();

    let mut origin = ClientUpstream::new(Client::new(), server.uri().parse().unwrap());
    let report = queue.sync(&mut origin).await;

    assert_eq!(report.status, SyncStatus::Completed);
    assert_eq!(report.replayed.len(), 1);
    assert!(queue.is_empty().await);
}
