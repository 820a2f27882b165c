//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use lb_dispatch::config::DispatchConfig;
use lb_dispatch::discovery::ServiceDiscovery;
use lb_dispatch::lifecycle::{Dispatcher, Shutdown};
use lb_dispatch::DispatchService;

/// A dispatcher running on an ephemeral port.
pub struct TestDispatcher {
    pub addr: SocketAddr,
    pub service: Arc<DispatchService>,
    pub shutdown: Shutdown,
}

impl TestDispatcher {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestDispatcher {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config with discovery off and short intervals.
pub fn test_config(policy: &str) -> DispatchConfig {
    let mut config = DispatchConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.dispatch.policy = policy.into();
    config.dispatch.reconcile_interval_secs = 1;
    config.dispatch.backoff_base_ms = 10;
    config.dispatch.backoff_max_ms = 100;
    config.discovery.enabled = false;
    config.backend.report_interval_secs = 1;
    config
}

pub async fn start_dispatcher(
    config: DispatchConfig,
    discovery: Option<Arc<dyn ServiceDiscovery>>,
) -> TestDispatcher {
    let mut dispatcher = Dispatcher::new(config).expect("valid config");
    if let Some(discovery) = discovery {
        dispatcher = dispatcher.with_discovery(discovery);
    }
    let service = dispatcher.service();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let run_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = dispatcher.run(listener, &run_shutdown).await;
    });

    wait_until(Duration::from_secs(5), || async move {
        reqwest::get(format!("http://{}/health", addr)).await.is_ok()
    })
    .await;

    TestDispatcher {
        addr,
        service,
        shutdown,
    }
}

/// Poll `check` every 20ms until it returns true or `limit` elapses.
pub async fn wait_until<F, Fut>(limit: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[derive(Clone, Default)]
struct ConsulState {
    /// service name -> [(id, address, port)]
    services: Arc<Mutex<HashMap<String, Vec<(String, String, u16)>>>>,
    down: Arc<AtomicBool>,
}

/// Minimal stand-in for the Consul agent HTTP API.
pub struct MockConsul {
    pub addr: SocketAddr,
    state: ConsulState,
}

impl MockConsul {
    pub async fn start() -> Self {
        let state = ConsulState::default();
        let app = Router::new()
            .route("/v1/agent/service/register", put(register))
            .route("/v1/agent/service/deregister/{id}", put(deregister))
            .route("/v1/health/service/{name}", get(health_service))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn add(&self, service: &str, address: &str, port: u16) {
        let id = format!("{}-{}-{}", service, address, port);
        self.state
            .services
            .lock()
            .unwrap()
            .entry(service.to_string())
            .or_default()
            .push((id, address.to_string(), port));
    }

    pub fn remove(&self, service: &str, address: &str, port: u16) {
        if let Some(list) = self.state.services.lock().unwrap().get_mut(service) {
            list.retain(|(_, a, p)| !(a == address && *p == port));
        }
    }

    pub fn members(&self, service: &str) -> Vec<String> {
        self.state
            .services
            .lock()
            .unwrap()
            .get(service)
            .map(|list| list.iter().map(|(_, a, p)| format!("{}:{}", a, p)).collect())
            .unwrap_or_default()
    }

    pub fn set_down(&self, down: bool) {
        self.state.down.store(down, Ordering::SeqCst);
    }
}

async fn register(State(state): State<ConsulState>, Json(body): Json<Value>) -> StatusCode {
    if state.down.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    let id = body["ID"].as_str().unwrap_or_default().to_string();
    let name = body["Name"].as_str().unwrap_or_default().to_string();
    let address = body["Address"].as_str().unwrap_or_default().to_string();
    let port = body["Port"].as_u64().unwrap_or_default() as u16;

    let mut services = state.services.lock().unwrap();
    let list = services.entry(name).or_default();
    list.retain(|(existing, _, _)| *existing != id);
    list.push((id, address, port));
    StatusCode::OK
}

async fn deregister(State(state): State<ConsulState>, Path(id): Path<String>) -> StatusCode {
    for list in state.services.lock().unwrap().values_mut() {
        list.retain(|(existing, _, _)| *existing != id);
    }
    StatusCode::OK
}

async fn health_service(
    State(state): State<ConsulState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    if state.down.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!("agent unavailable")));
    }
    let entries: Vec<Value> = state
        .services
        .lock()
        .unwrap()
        .get(&name)
        .map(|list| {
            list.iter()
                .map(|(_, address, port)| {
                    json!({
                        "Node": { "Address": "127.0.0.1" },
                        "Service": { "Address": address, "Port": port },
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    (StatusCode::OK, Json(Value::Array(entries)))
}
