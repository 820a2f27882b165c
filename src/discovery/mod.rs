//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Backend / dispatcher startup:
//!     → ServiceDiscovery::register (service id, address, port, TCP check)
//!
//! Reconciler (reconciler.rs), every interval:
//!     → ServiceDiscovery::query_healthy(backend service)   [no lock held]
//!     → DispatchService::reconcile(addresses)              [lock held]
//!     → on failure: log, back off, try again next tick
//!
//! Client startup:
//!     → ServiceDiscovery::query_healthy(dispatcher service)
//! ```
//!
//! # Design Decisions
//! - Any directory offering register + healthy-member query is substitutable
//! - consul.rs talks to a Consul agent over its HTTP API
//! - memory.rs backs tests and deployments without a directory

pub mod consul;
pub mod memory;
pub mod reconciler;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use consul::ConsulDiscovery;
pub use memory::StaticDiscovery;
pub use reconciler::Reconciler;

/// A transient failure talking to the discovery backend.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("discovery backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("discovery backend unavailable: {0}")]
    Unavailable(String),
    #[error("invalid discovery url: {0}")]
    Url(#[from] url::ParseError),
}

/// One healthy instance of a service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub address: String,
    pub port: u16,
}

impl Member {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// `address:port`, the registry key for this member.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Split a `host:port` string.
    pub fn parse(endpoint: &str) -> Option<Self> {
        let (host, port) = endpoint.rsplit_once(':')?;
        if host.is_empty() {
            return None;
        }
        Some(Self::new(host, port.parse().ok()?))
    }
}

/// A service instance announced to the discovery backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistration {
    pub service_name: String,
    pub member: Member,
    /// How often the directory should probe the instance.
    pub check_interval: Duration,
}

impl ServiceRegistration {
    pub fn new(service_name: impl Into<String>, member: Member, check_interval: Duration) -> Self {
        Self {
            service_name: service_name.into(),
            member,
            check_interval,
        }
    }

    /// Stable instance id: `{service}-{address}-{port}`.
    pub fn service_id(&self) -> String {
        format!(
            "{}-{}-{}",
            self.service_name, self.member.address, self.member.port
        )
    }
}

/// The two capabilities the dispatch core needs from a directory.
#[async_trait]
pub trait ServiceDiscovery: Send + Sync {
    /// Announce an instance together with its health check.
    async fn register(&self, registration: &ServiceRegistration) -> Result<(), DiscoveryError>;

    /// Withdraw an instance by id.
    async fn deregister(&self, service_id: &str) -> Result<(), DiscoveryError>;

    /// Currently healthy members of `service_name`, in directory order.
    async fn query_healthy(&self, service_name: &str) -> Result<Vec<Member>, DiscoveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_endpoint_round_trip() {
        let member = Member::parse("localhost:50052").unwrap();
        assert_eq!(member, Member::new("localhost", 50052));
        assert_eq!(member.endpoint(), "localhost:50052");
    }

    #[test]
    fn test_member_parse_rejects_malformed() {
        assert!(Member::parse("localhost").is_none());
        assert!(Member::parse(":80").is_none());
        assert!(Member::parse("host:port").is_none());
    }

    #[test]
    fn test_service_id() {
        let reg = ServiceRegistration::new(
            "backendserver",
            Member::new("localhost", 50052),
            Duration::from_secs(10),
        );
        assert_eq!(reg.service_id(), "backendserver-localhost-50052");
    }
}
