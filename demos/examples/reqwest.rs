//! reqwest client with an offline-first cache persisted in FeOxDB.
//!
//! Point `OFFSYNC_ORIGIN` at a running storefront backend (default
//! `http://localhost:8100`). The first run installs the app shell and caches
//! API responses; stop the backend and run again to see responses served
//! from the on-disk buckets and mutations queued for later.
//!
//! Run:
//!   cargo run -p offsync-demos --example reqwest

use offsync::{ActionQueue, Config, Connectivity, Dispatcher, NewAction};
use offsync_feoxdb::FeOxDbBackend;
use offsync_reqwest::{ClientUpstream, OfflineMiddleware};
use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use serde_json::json;

const CONFIG: &str = r#"
api_prefix: /api/
bucket_version: v1
offline_message: "Sin conexión"
manifest:
  app_shell: ["/", "/products", "/orders"]
  static_assets: ["/static/js/bundle.js", "/favicon.png"]
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter("info,offsync=debug")
        .init();

    let origin = std::env::var("OFFSYNC_ORIGIN").unwrap_or_else(|_| "http://localhost:8100".to_owned());
    let data_dir = std::env::temp_dir().join("offsync-demo");
    std::fs::create_dir_all(&data_dir)?;

    let config = Config::from_yaml(CONFIG)?;
    let backend = FeOxDbBackend::builder().path(&data_dir).build()?;
    let dispatcher = Dispatcher::new(backend.clone(), config.clone())?;

    let mut upstream = ClientUpstream::new(Client::new(), origin.parse()?);
    match dispatcher.install(&mut upstream).await {
        Ok(report) => tracing::info!(?report, "installed"),
        Err(error) => {
            // Previously installed buckets are still on disk.
            tracing::warn!(%error, "install failed, activating with what is cached");
            dispatcher.activate().await?;
        }
    }
    tracing::info!(state = %dispatcher.state(), "dispatcher ready");

    let client = ClientBuilder::new(Client::new())
        .with(OfflineMiddleware::new(dispatcher))
        .build();

    for path in ["/api/products", "/products", "/api/orders"] {
        let response = client
            .get(format!("{origin}{path}"))
            .header("accept", "text/html,application/json")
            .send()
            .await?;
        tracing::info!(
            path,
            status = %response.status(),
            source = ?response.headers().get("x-offsync-source"),
            "fetched"
        );
    }

    let online = Client::new().get(format!("{origin}/")).send().await.is_ok();
    let connectivity = Connectivity::new(online);
    let queue = ActionQueue::load(backend.clone(), connectivity.clone(), &config).await;
    queue.tokens().set("demo-token").await?;

    if !online {
        queue
            .enqueue(NewAction::post("/api/orders", json!({ "productId": 1, "quantity": 2 })))
            .await?;
        tracing::info!(pending = queue.len().await, "order queued while offline");
    }

    let report = queue.sync(&mut upstream).await;
    tracing::info!(?report, "sync");

    backend.flush();
    Ok(())
}
