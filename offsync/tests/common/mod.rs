#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{HeaderMap, Method, Request, Response, StatusCode, header::ACCEPT};
use offsync::{Config, Dispatched, Dispatcher, RequestHead, Upstream, UpstreamError};
use offsync_moka::MokaBackend;
use tokio::sync::Notify;

/// Request seen by [`MockUpstream`].
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Default)]
struct State {
    offline: bool,
    routes: HashMap<String, (StatusCode, Bytes)>,
    calls: Vec<Call>,
}

/// Pauses every call until released.
#[derive(Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

/// Scriptable network. Unknown paths answer `200` with `"{METHOD} {path}"`.
#[derive(Clone, Default)]
pub struct MockUpstream {
    state: Arc<Mutex<State>>,
    gate: Option<Gate>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> (Self, Gate) {
        let gate = Gate::default();
        let upstream = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (upstream, gate)
    }

    pub fn set_online(&self, online: bool) {
        self.state.lock().unwrap().offline = !online;
    }

    pub fn respond(&self, path: &str, status: u16, body: &'static str) {
        self.state.lock().unwrap().routes.insert(
            path.to_owned(),
            (StatusCode::from_u16(status).unwrap(), Bytes::from_static(body.as_bytes())),
        );
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }
}

impl Upstream<Request<Bytes>> for MockUpstream {
    type Future = BoxFuture<'static, Result<Response<Bytes>, UpstreamError>>;

    fn call(&mut self, req: Request<Bytes>) -> Self::Future {
        let state = self.state.clone();
        let gate = self.gate.clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
            let (parts, body) = req.into_parts();
            let path = parts.uri.path().to_owned();
            let mut state = state.lock().unwrap();
            state.calls.push(Call {
                method: parts.method.clone(),
                uri: parts.uri.to_string(),
                headers: parts.headers,
                body,
            });
            if state.offline {
                return Err(UpstreamError::transport("connection refused"));
            }
            let (status, body) = state
                .routes
                .get(&path)
                .cloned()
                .unwrap_or_else(|| (StatusCode::OK, Bytes::from(format!("{} {path}", parts.method))));
            let mut response = Response::new(body);
            *response.status_mut() = status;
            Ok(response)
        })
    }
}

pub fn backend() -> MokaBackend {
    MokaBackend::builder().max_entries(1_000).build()
}

/// Config with a small manifest.
pub fn config() -> Config {
    Config::builder()
        .static_assets(["/static/js/bundle.js", "/favicon.png"])
        .app_shell(["/", "/products"])
        .build()
        .unwrap()
}

/// Installed and activated dispatcher.
pub async fn activated(config: Config, upstream: &mut MockUpstream) -> Dispatcher<MokaBackend> {
    let dispatcher = Dispatcher::new(backend(), config).unwrap();
    dispatcher.install(upstream).await.unwrap();
    dispatcher
}

pub fn get(uri: &str, html: bool) -> Request<Bytes> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if html {
        builder = builder.header(ACCEPT, "text/html,application/xhtml+xml");
    }
    builder.body(Bytes::new()).unwrap()
}

/// Routes and dispatches like a framework adapter would.
pub async fn fetch(
    dispatcher: &Dispatcher<MokaBackend>,
    upstream: &mut MockUpstream,
    request: Request<Bytes>,
) -> Option<Dispatched> {
    let head = RequestHead::from_request(&request);
    let kind = dispatcher.route(&head)?;
    Some(dispatcher.dispatch(kind, &head, request, upstream).await)
}
