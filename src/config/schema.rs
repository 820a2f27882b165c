//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! dispatch service and the backend worker. All types derive Serde traits
//! for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration shared by every binary in the crate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DispatchConfig {
    /// Listener configuration for the dispatch service.
    pub listener: ListenerConfig,

    /// Selection policy and reconciliation settings.
    pub dispatch: PolicyConfig,

    /// Service discovery backend settings.
    pub discovery: DiscoveryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Settings used by the backend worker process.
    pub backend: BackendConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:50051").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:50051".to_string(),
        }
    }
}

/// Selection policy and registry maintenance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// One of `PickFirst`, `RoundRobin`, `LeastLoad`.
    pub policy: String,

    /// Seconds between discovery reconciliations.
    pub reconcile_interval_secs: u64,

    /// Base delay added after a failed discovery query, in milliseconds.
    pub backoff_base_ms: u64,

    /// Upper bound for the failure backoff, in milliseconds.
    pub backoff_max_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            policy: "RoundRobin".to_string(),
            reconcile_interval_secs: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 30_000,
        }
    }
}

impl PolicyConfig {
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }
}

/// Service discovery (Consul agent) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Use the discovery backend. When false, membership comes only from
    /// explicit registrations.
    pub enabled: bool,

    /// Base URL of the discovery agent HTTP API.
    pub url: String,

    /// Service name backends register under.
    pub backend_service: String,

    /// Service name dispatchers register under.
    pub dispatcher_service: String,

    /// Interval of the TCP health check attached to each registration.
    pub health_check_interval_secs: u64,

    /// Timeout for a single discovery query.
    pub query_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://127.0.0.1:8500".to_string(),
            backend_service: "backendserver".to_string(),
            dispatcher_service: "loadbalancer".to_string(),
            health_check_interval_secs: 10,
            query_timeout_secs: 5,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-request timeout for inbound RPCs, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Backend worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Address the worker listens on.
    pub bind_address: String,

    /// Address announced to discovery and the dispatcher. Defaults to
    /// the address the listener actually bound when empty.
    pub advertise_address: String,

    /// Base URL of the dispatch service.
    pub dispatcher_url: String,

    /// Seconds between load reports.
    pub report_interval_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:50052".to_string(),
            advertise_address: String::new(),
            dispatcher_url: "http://127.0.0.1:50051".to_string(),
            report_interval_secs: 3,
        }
    }
}

impl BackendConfig {
    /// The announced address, falling back to `bound`.
    pub fn advertised(&self, bound: &str) -> String {
        if self.advertise_address.is_empty() {
            bound.to_string()
        } else {
            self.advertise_address.clone()
        }
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}
