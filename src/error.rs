//! Error types for the dispatch core.
//!
//! None of these are fatal at request time: `UnknownServer` becomes a
//! `success=false` response and `NoServersAvailable` an empty address.
//! `InvalidPolicy` is only produced while loading configuration.

use thiserror::Error;

/// Failures raised by the registry and the selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// A load report named an address the registry has never seen.
    #[error("unknown server: {0}")]
    UnknownServer(String),

    /// The registry has no members to choose from.
    #[error("no servers available")]
    NoServersAvailable,

    /// The configured policy name is not one of the supported policies.
    #[error("invalid policy '{0}', expected one of PickFirst, RoundRobin, LeastLoad")]
    InvalidPolicy(String),
}
