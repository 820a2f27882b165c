//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_registered_servers` (gauge): current registry size
//! - `dispatch_selections_total` (counter): GetServer outcomes by policy
//! - `dispatch_load_reports_total` (counter): accepted / rejected reports
//! - `dispatch_reconcile_total` (counter): reconciliation ticks by outcome
//! - `backend_in_flight_requests` (gauge): requests running on a backend
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade, so it is a no-op until
//!   an exporter is installed
//! - The Prometheus exporter runs its own listener

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::load_balancer::Policy;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_registered_servers(count: usize) {
    gauge!("dispatch_registered_servers").set(count as f64);
}

pub fn record_selection(policy: Policy, found: bool) {
    let outcome = if found { "assigned" } else { "empty" };
    counter!("dispatch_selections_total", "policy" => policy.as_str(), "outcome" => outcome)
        .increment(1);
}

pub fn record_load_report(accepted: bool) {
    let outcome = if accepted { "accepted" } else { "unknown_server" };
    counter!("dispatch_load_reports_total", "outcome" => outcome).increment(1);
}

pub fn record_reconcile(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("dispatch_reconcile_total", "outcome" => outcome).increment(1);
}

pub fn record_in_flight(count: u64) {
    gauge!("backend_in_flight_requests").set(count as f64);
}
