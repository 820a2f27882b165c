//! HTTP server for the dispatch service.
//!
//! # Responsibilities
//! - Create the Axum Router for the dispatch operations
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve until the shutdown signal fires
//!
//! The handlers only translate between JSON bodies and `DispatchService`
//! calls; every decision is made there.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::DispatchConfig;
use crate::dispatch::protocol::{
    LoadReport, ServerAddress, ServerInfo, StatusReport, SuccessResponse, GET_SERVER_PATH,
    HEALTH_PATH, REGISTER_PATH, REPORT_LOAD_PATH, STATUS_PATH,
};
use crate::dispatch::DispatchService;
use crate::http::request::{propagate_request_id_layer, request_span, set_request_id_layer};
use crate::lifecycle::shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DispatchService>,
}

/// HTTP server exposing the dispatch operations.
pub struct DispatchServer {
    router: Router,
    service: Arc<DispatchService>,
}

impl DispatchServer {
    pub fn new(config: &DispatchConfig, service: Arc<DispatchService>) -> Self {
        let state = AppState {
            service: service.clone(),
        };
        let router = Self::build_router(config, state);
        Self { router, service }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DispatchConfig, state: AppState) -> Router {
        Router::new()
            .route(REGISTER_PATH, post(register_server))
            .route(REPORT_LOAD_PATH, post(report_load))
            .route(GET_SERVER_PATH, post(get_server))
            .route(STATUS_PATH, get(status))
            .route(HEALTH_PATH, get(health))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(set_request_id_layer())
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            policy = %self.service.policy(),
            "Dispatch service listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("Dispatch service stopped");
        Ok(())
    }
}

async fn register_server(
    State(state): State<AppState>,
    Json(request): Json<ServerInfo>,
) -> Json<SuccessResponse> {
    let success = state.service.register_server(&request.address);
    Json(SuccessResponse { success })
}

async fn report_load(
    State(state): State<AppState>,
    Json(report): Json<LoadReport>,
) -> Json<SuccessResponse> {
    let success = state.service.report_load(&report.address, report.load);
    Json(SuccessResponse { success })
}

/// The request body is ignored; GetServer takes no arguments.
async fn get_server(State(state): State<AppState>) -> Json<ServerAddress> {
    let address = state.service.get_server().unwrap_or_default();
    Json(ServerAddress { address })
}

async fn status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(state.service.status())
}

async fn health() -> &'static str {
    "ok"
}
