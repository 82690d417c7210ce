//! Tower layer over a flaky origin.
//!
//! The origin is a local tower service that can be switched off. The demo
//! installs the dispatcher, reads a few pages online, goes offline, reads
//! them again from cache, queues a mutation and replays it on reconnect.
//!
//! Run:
//!   cargo run -p offsync-demos --example tower

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response, StatusCode, header::ACCEPT};
use http_body_util::{BodyExt, Full};
use offsync::{ActionQueue, Config, Connectivity, Dispatcher, NewAction};
use offsync_backend::MemoryStorage;
use offsync_moka::MokaBackend;
use offsync_tower::{OfflineLayer, TowerUpstream};
use serde_json::json;
use tower::{BoxError, Service, ServiceBuilder, ServiceExt, service_fn};

type Body = Full<Bytes>;

fn origin(
    online: Arc<AtomicBool>,
) -> impl Service<Request<Body>, Response = Response<Body>, Error = io::Error, Future: Send>
+ Clone
+ Send
+ 'static {
    service_fn(move |req: Request<Body>| {
        let online = online.clone();
        async move {
            if !online.load(Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "origin is down"));
            }
            let body = format!("{} {} from origin", req.method(), req.uri().path());
            let mut response = Response::new(Full::new(Bytes::from(body)));
            if req.method() != http::Method::GET {
                *response.status_mut() = StatusCode::CREATED;
            }
            Ok(response)
        }
    })
}

async fn show<S>(service: &mut S, path: &str, html: bool) -> Result<(), BoxError>
where
    S: Service<Request<Body>, Response = Response<offsync_tower::OffsyncBody<Body>>>,
    S::Error: Into<BoxError>,
{
    let mut builder = Request::get(path);
    if html {
        builder = builder.header(ACCEPT, "text/html");
    }
    let response = service
        .ready()
        .await
        .map_err(Into::into)?
        .call(builder.body(Full::new(Bytes::new()))?)
        .await
        .map_err(Into::into)?;
    let source = response
        .headers()
        .get("x-offsync-source")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("none")
        .to_owned();
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes();
    tracing::info!(path, %status, source = %source, body = %String::from_utf8_lossy(&body), "response");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter("info,offsync=debug")
        .init();

    let online = Arc::new(AtomicBool::new(true));
    let config = Config::builder()
        .bucket_version("demo")
        .app_shell(["/", "/products"])
        .static_assets(["/static/js/bundle.js"])
        .build()?;

    let backend = MokaBackend::builder().max_entries(1_000).build();
    let dispatcher = Dispatcher::new(backend, config.clone())?;
    let mut installer: TowerUpstream<_, Body, Body> = TowerUpstream::new(origin(online.clone()));
    let report = dispatcher.install(&mut installer).await?;
    tracing::info!(?report, "installed");

    let mut service = ServiceBuilder::new()
        .layer(OfflineLayer::new(dispatcher))
        .service(origin(online.clone()));

    show(&mut service, "/api/products", false).await?;
    show(&mut service, "/static/js/bundle.js", false).await?;

    let connectivity = Connectivity::new(true);
    let queue = ActionQueue::load(Arc::new(MemoryStorage::new()), connectivity.clone(), &config).await;
    let replayer: TowerUpstream<_, Body, Body> = TowerUpstream::new(origin(online.clone()));
    let auto_sync = queue.spawn_auto_sync(replayer);

    tracing::info!("origin going down");
    online.store(false, Ordering::SeqCst);
    connectivity.set_online(false);

    show(&mut service, "/api/products", false).await?;
    show(&mut service, "/orders/7", true).await?;
    show(&mut service, "/api/customers", false).await?;

    queue
        .enqueue(NewAction::post("/api/products", json!({ "name": "Desk lamp" })))
        .await?;
    tracing::info!(pending = queue.len().await, "mutation queued");

    tracing::info!("origin back up");
    online.store(true, Ordering::SeqCst);
    connectivity.set_online(true);

    for _ in 0..50 {
        if queue.is_empty().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tracing::info!(pending = queue.len().await, "after reconnect");

    auto_sync.abort();
    Ok(())
}
