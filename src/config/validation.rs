//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Resolve the policy name once, before anything starts serving
//! - Validate value ranges (intervals > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function of the config

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::DispatchConfig;
use crate::load_balancer::Policy;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check the whole configuration, collecting every problem found.
pub fn validate_config(config: &DispatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.dispatch.policy.parse::<Policy>() {
        errors.push(ValidationError::new("dispatch.policy", e.to_string()));
    }
    if config.dispatch.reconcile_interval_secs == 0 {
        errors.push(ValidationError::new(
            "dispatch.reconcile_interval_secs",
            "must be greater than zero",
        ));
    }
    if config.dispatch.backoff_base_ms > config.dispatch.backoff_max_ms {
        errors.push(ValidationError::new(
            "dispatch.backoff_base_ms",
            "must not exceed dispatch.backoff_max_ms",
        ));
    }

    check_socket_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_socket_addr(&mut errors, "backend.bind_address", &config.backend.bind_address);
    if !config.backend.advertise_address.is_empty() {
        check_host_port(&mut errors, "backend.advertise_address", &config.backend.advertise_address);
    }
    check_url(&mut errors, "backend.dispatcher_url", &config.backend.dispatcher_url);
    if config.backend.report_interval_secs == 0 {
        errors.push(ValidationError::new(
            "backend.report_interval_secs",
            "must be greater than zero",
        ));
    }

    if config.discovery.enabled {
        check_url(&mut errors, "discovery.url", &config.discovery.url);
        if config.discovery.backend_service.trim().is_empty() {
            errors.push(ValidationError::new("discovery.backend_service", "must not be empty"));
        }
        if config.discovery.dispatcher_service.trim().is_empty() {
            errors.push(ValidationError::new("discovery.dispatcher_service", "must not be empty"));
        }
        if config.discovery.query_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "discovery.query_timeout_secs",
                "must be greater than zero",
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }
    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if let Err(e) = value.parse::<SocketAddr>() {
        errors.push(ValidationError::new(field, format!("'{}' is not a socket address: {}", value, e)));
    }
}

/// Advertised addresses may use a hostname, so only the `host:port` shape is checked.
fn check_host_port(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = value
        .rsplit_once(':')
        .map(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::new(field, format!("'{}' is not host:port", value)));
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if let Err(e) = Url::parse(value) {
        errors.push(ValidationError::new(field, format!("'{}' is not a URL: {}", value, e)));
    }
}
