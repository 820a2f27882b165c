//! Registry entry for a single backend.

use serde::{Deserialize, Serialize};

/// A backend instance known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    /// `host:port` identity. Never changes once the entry exists.
    pub address: String,
    /// Most recent self-reported concurrent request count.
    pub load: u64,
}

impl ServerEntry {
    /// Create an entry on first sight, with zero load.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            load: 0,
        }
    }
}
