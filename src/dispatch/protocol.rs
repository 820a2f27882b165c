//! Request and response bodies for the remote operations.
//!
//! | Operation      | Route               | Request        | Response          |
//! |----------------|---------------------|----------------|-------------------|
//! | RegisterServer | `POST /register`    | `ServerInfo`   | `SuccessResponse` |
//! | ReportLoad     | `POST /report-load` | `LoadReport`   | `SuccessResponse` |
//! | GetServer      | `POST /get-server`  | `ClientRequest`| `ServerAddress`   |
//! | ProcessRequest | `POST /process`     | `WorkRequest`  | `WorkResponse`    |

use serde::{Deserialize, Serialize};

use crate::registry::ServerEntry;

pub const REGISTER_PATH: &str = "/register";
pub const REPORT_LOAD_PATH: &str = "/report-load";
pub const GET_SERVER_PATH: &str = "/get-server";
pub const PROCESS_PATH: &str = "/process";
pub const STATUS_PATH: &str = "/status";
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub address: String,
    pub load: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// GetServer takes no arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRequest {}

/// Chosen backend. An empty address means none is available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddress {
    pub address: String,
}

impl ServerAddress {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn into_option(self) -> Option<String> {
        if self.address.is_empty() {
            None
        } else {
            Some(self.address)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRequest {
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkResponse {
    pub result: String,
}

/// Registry view served on `/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub version: String,
    pub policy: String,
    pub cursor: usize,
    pub servers: Vec<ServerEntry>,
}
