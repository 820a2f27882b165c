//! Consul agent discovery backend.
//!
//! Uses the agent HTTP API:
//! - `PUT /v1/agent/service/register`
//! - `PUT /v1/agent/service/deregister/{id}`
//! - `GET /v1/health/service/{name}?passing=true`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::DiscoveryConfig;
use crate::discovery::{DiscoveryError, Member, ServiceDiscovery, ServiceRegistration};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceRegistration<'a> {
    #[serde(rename = "ID")]
    id: String,
    name: &'a str,
    address: &'a str,
    port: u16,
    check: AgentServiceCheck,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceCheck {
    #[serde(rename = "TCP")]
    tcp: String,
    interval: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceEntry {
    node: NodeInfo,
    service: ServiceInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeInfo {
    #[serde(default)]
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceInfo {
    #[serde(default)]
    address: String,
    port: u16,
}

impl ServiceEntry {
    /// The service address wins; an empty one falls back to the node's.
    fn into_member(self) -> Member {
        let address = if self.service.address.is_empty() {
            self.node.address
        } else {
            self.service.address
        };
        Member::new(address, self.service.port)
    }
}

/// Discovery client for a Consul agent.
#[derive(Debug, Clone)]
pub struct ConsulDiscovery {
    client: Client,
    base_url: Url,
}

impl ConsulDiscovery {
    /// Create a client for the agent at `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DiscoveryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn from_config(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        Self::new(&config.url, Duration::from_secs(config.query_timeout_secs))
    }

    fn endpoint(&self, path: &str) -> Result<Url, DiscoveryError> {
        Ok(self.base_url.join(path)?)
    }

    async fn ensure_success(response: Response) -> Result<Response, DiscoveryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DiscoveryError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ServiceDiscovery for ConsulDiscovery {
    async fn register(&self, registration: &ServiceRegistration) -> Result<(), DiscoveryError> {
        let member = &registration.member;
        let body = AgentServiceRegistration {
            id: registration.service_id(),
            name: &registration.service_name,
            address: &member.address,
            port: member.port,
            check: AgentServiceCheck {
                tcp: member.endpoint(),
                interval: format!("{}s", registration.check_interval.as_secs().max(1)),
            },
        };

        let response = self
            .client
            .put(self.endpoint("v1/agent/service/register")?)
            .json(&body)
            .send()
            .await?;
        Self::ensure_success(response).await?;

        tracing::info!(
            service = %registration.service_name,
            address = %member.endpoint(),
            "Registered with discovery backend"
        );
        Ok(())
    }

    async fn deregister(&self, service_id: &str) -> Result<(), DiscoveryError> {
        let url = self.endpoint(&format!("v1/agent/service/deregister/{}", service_id))?;
        let response = self.client.put(url).send().await?;
        Self::ensure_success(response).await?;
        tracing::info!(service_id = %service_id, "Deregistered from discovery backend");
        Ok(())
    }

    async fn query_healthy(&self, service_name: &str) -> Result<Vec<Member>, DiscoveryError> {
        let mut url = self.endpoint(&format!("v1/health/service/{}", service_name))?;
        url.query_pairs_mut().append_pair("passing", "true");

        let response = self.client.get(url).send().await?;
        let entries: Vec<ServiceEntry> = Self::ensure_success(response).await?.json().await?;
        Ok(entries.into_iter().map(ServiceEntry::into_member).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_entry_prefers_service_address() {
        let raw = r#"[
            {"Node": {"Address": "10.0.0.1"}, "Service": {"Address": "localhost", "Port": 50052}},
            {"Node": {"Address": "10.0.0.2"}, "Service": {"Address": "", "Port": 50053}}
        ]"#;
        let entries: Vec<ServiceEntry> = serde_json::from_str(raw).unwrap();
        let members: Vec<Member> = entries.into_iter().map(ServiceEntry::into_member).collect();
        assert_eq!(
            members,
            vec![Member::new("localhost", 50052), Member::new("10.0.0.2", 50053)]
        );
    }

    #[test]
    fn test_registration_body_shape() {
        let body = AgentServiceRegistration {
            id: "backendserver-localhost-50052".into(),
            name: "backendserver",
            address: "localhost",
            port: 50052,
            check: AgentServiceCheck {
                tcp: "localhost:50052".into(),
                interval: "10s".into(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["ID"], "backendserver-localhost-50052");
        assert_eq!(json["Name"], "backendserver");
        assert_eq!(json["Port"], 50052);
        assert_eq!(json["Check"]["TCP"], "localhost:50052");
        assert_eq!(json["Check"]["Interval"], "10s");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(ConsulDiscovery::new("not a url", Duration::from_secs(1)).is_err());
    }
}
