//! Client for the dispatch operations and the backend work route.
//!
//! Used by the backend reporter (register, report load), by the client CLI
//! (get server, process) and by the integration tests.

use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::discovery::ServiceDiscovery;
use crate::dispatch::protocol::{
    ClientRequest, LoadReport, ServerAddress, ServerInfo, StatusReport, SuccessResponse,
    WorkRequest, WorkResponse, GET_SERVER_PATH, PROCESS_PATH, REGISTER_PATH, REPORT_LOAD_PATH,
    STATUS_PATH,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned error status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Accept `host:port` or a full URL.
pub fn base_url(target: &str) -> String {
    let target = target.trim_end_matches('/');
    if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("http://{}", target)
    }
}

#[derive(Debug, Clone)]
pub struct DispatchClient {
    client: Client,
    base_url: String,
}

impl DispatchClient {
    pub fn new(dispatcher: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url(dispatcher),
        }
    }

    /// Same as `new`, with a per-request timeout.
    pub fn with_timeout(dispatcher: &str, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url(dispatcher),
        })
    }

    pub fn base(&self) -> &str {
        &self.base_url
    }

    async fn post<Req, Resp>(&self, url: String, body: &Req) -> Result<Resp, ClientError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// RegisterServer.
    pub async fn register(&self, address: &str) -> Result<bool, ClientError> {
        let body = ServerInfo {
            address: address.to_string(),
        };
        let response: SuccessResponse = self
            .post(format!("{}{}", self.base_url, REGISTER_PATH), &body)
            .await?;
        Ok(response.success)
    }

    /// ReportLoad. `Ok(false)` means the dispatcher does not know `address`.
    pub async fn report_load(&self, address: &str, load: u64) -> Result<bool, ClientError> {
        let body = LoadReport {
            address: address.to_string(),
            load,
        };
        let response: SuccessResponse = self
            .post(format!("{}{}", self.base_url, REPORT_LOAD_PATH), &body)
            .await?;
        Ok(response.success)
    }

    /// GetServer. `Ok(None)` means no backend is available right now.
    pub async fn get_server(&self) -> Result<Option<String>, ClientError> {
        let response: ServerAddress = self
            .post(format!("{}{}", self.base_url, GET_SERVER_PATH), &ClientRequest {})
            .await?;
        Ok(response.into_option())
    }

    pub async fn status(&self) -> Result<StatusReport, ClientError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, STATUS_PATH))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// ProcessRequest, sent straight to the backend the dispatcher named.
    pub async fn process(&self, backend: &str, data: &str) -> Result<String, ClientError> {
        let body = WorkRequest {
            data: data.to_string(),
        };
        let response: WorkResponse = self
            .post(format!("{}{}", base_url(backend), PROCESS_PATH), &body)
            .await?;
        Ok(response.result)
    }
}

/// First healthy dispatcher registered under `service_name`, if any.
pub async fn discover_dispatcher(
    discovery: &dyn ServiceDiscovery,
    service_name: &str,
) -> Option<String> {
    match discovery.query_healthy(service_name).await {
        Ok(members) => members.first().map(|m| m.endpoint()),
        Err(e) => {
            tracing::warn!(service = %service_name, error = %e, "Dispatcher lookup failed");
            None
        }
    }
}
