//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use roundrobin_proxy::config::{HealthCheckConfig, LoadBalancerConfig, ProxyConfig};
use roundrobin_proxy::health::HealthState;
use roundrobin_proxy::http::{HttpServer, ServerError};
use roundrobin_proxy::load_balancer::BackendPool;
use roundrobin_proxy::Shutdown;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A scripted answer for the next POST a mock backend receives.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(u16, Value),
    Empty(u16),
    Raw(u16, &'static str),
}

struct MockState {
    name: String,
    hits: AtomicUsize,
    health_hits: AtomicUsize,
    health_status: AtomicU16,
    delay_ms: AtomicUsize,
    script: Mutex<VecDeque<Reply>>,
}

/// An axum backend on an ephemeral port.
///
/// By default every POST answers 200 with
/// `{"backend": name, "path": path+query, "payload": body}` and
/// `GET /health` answers 200.
pub struct MockBackend {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start(name: &str) -> Self {
        let state = Arc::new(MockState {
            name: name.to_string(),
            hits: AtomicUsize::new(0),
            health_hits: AtomicUsize::new(0),
            health_status: AtomicU16::new(200),
            delay_ms: AtomicUsize::new(0),
            script: Mutex::new(VecDeque::new()),
        });

        let app = Router::new()
            .route("/health", get(health))
            .fallback(handle)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn health_hits(&self) -> usize {
        self.state.health_hits.load(Ordering::SeqCst)
    }

    pub fn push_reply(&self, reply: Reply) {
        self.state.script.lock().unwrap().push_back(reply);
    }

    pub fn set_health(&self, status: u16) {
        self.state.health_status.store(status, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state
            .delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }
}

async fn health(State(state): State<Arc<MockState>>) -> StatusCode {
    state.health_hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::from_u16(state.health_status.load(Ordering::SeqCst)).unwrap()
}

async fn handle(State(state): State<Arc<MockState>>, uri: Uri, body: Bytes) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let delay = state.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay as u64)).await;
    }

    let scripted = state.script.lock().unwrap().pop_front();
    match scripted {
        Some(Reply::Json(status, body)) => (status_code(status), Json(body)).into_response(),
        Some(Reply::Empty(status)) => status_code(status).into_response(),
        Some(Reply::Raw(status, text)) => (status_code(status), text).into_response(),
        None => {
            let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            let path = uri.path_and_query().map_or("/", |pq| pq.as_str());
            Json(json!({ "backend": state.name, "path": path, "payload": payload })).into_response()
        }
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap()
}

/// URL of a local port with nothing listening on it.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Proxy config with the given backends and health probing disabled.
pub fn proxy_config(backends: Vec<String>) -> ProxyConfig {
    ProxyConfig {
        load_balancer: LoadBalancerConfig {
            backends,
            max_attempts: None,
        },
        health_check: HealthCheckConfig {
            enabled: false,
            ..HealthCheckConfig::default()
        },
        ..ProxyConfig::default()
    }
}

/// A proxy serving on an ephemeral port.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub health: Arc<HealthState>,
    pub pool: Arc<BackendPool>,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl RunningProxy {
    pub async fn start(config: ProxyConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = HttpServer::new(config).unwrap();
        let health = server.health().clone();
        let pool = server.pool().clone();

        let shutdown = Shutdown::new();
        let handle = tokio::spawn(server.run(listener, shutdown.clone()));

        Self {
            addr,
            health,
            pool,
            shutdown,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server and prober to stop.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("proxy did not stop in time")
            .unwrap()
            .unwrap();
    }
}

/// Poll `condition` every 50ms until it holds or `limit` passes.
pub async fn wait_until<F>(limit: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    condition()
}
