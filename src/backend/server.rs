//! HTTP server for a backend worker.
//!
//! Serves `ProcessRequest`. The dispatcher never sees this traffic; clients
//! call the worker directly once GetServer has named it.

use std::time::Duration;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::backend::in_flight::InFlight;
use crate::dispatch::protocol::{WorkRequest, WorkResponse, HEALTH_PATH, PROCESS_PATH};
use crate::http::request::{propagate_request_id_layer, request_span, set_request_id_layer};
use crate::lifecycle::shutdown;

#[derive(Clone)]
struct WorkerState {
    in_flight: InFlight,
}

/// The work-serving half of a backend process.
pub struct BackendServer {
    router: Router,
    in_flight: InFlight,
}

impl BackendServer {
    #[allow(deprecated)]
    pub fn new(request_timeout: Duration) -> Self {
        let in_flight = InFlight::new();
        let state = WorkerState {
            in_flight: in_flight.clone(),
        };
        let router = Router::new()
            .route(PROCESS_PATH, post(process_request))
            .route(HEALTH_PATH, get(|| async { "ok" }))
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(set_request_id_layer());
        Self { router, in_flight }
    }

    /// Counter shared with the load reporter.
    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Backend server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("Backend server stopped");
        Ok(())
    }
}

/// The work itself: echo the payload back, tagged.
pub fn process(data: &str) -> String {
    format!("Processed: {}", data)
}

async fn process_request(
    State(state): State<WorkerState>,
    Json(request): Json<WorkRequest>,
) -> Json<WorkResponse> {
    let _guard = state.in_flight.enter();
    let result = process(&request.data);
    tracing::info!(data = %request.data, in_flight = state.in_flight.current(), "Request processed");
    Json(WorkResponse { result })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_tags_payload() {
        assert_eq!(process("resize image"), "Processed: resize image");
    }
}
