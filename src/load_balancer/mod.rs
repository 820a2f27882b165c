//! Backend selection subsystem.
//!
//! # Data Flow
//! ```text
//! GetServer
//!     → registry snapshot (under the dispatch lock)
//!     → select(snapshot, policy):
//!         - pick_first.rs (always the first-seen member)
//!         - round_robin.rs (member under the registry cursor)
//!         - least_load.rs (lowest reported load, earliest on ties)
//!     → caller advances the cursor if the policy rotates
//!     → address or None
//! ```
//!
//! # Design Decisions
//! - Selection is a pure function of the snapshot; no selector keeps state
//! - The rotation cursor lives in the registry so it survives reconciliation
//! - The policy is parsed once when the service starts

pub mod least_load;
pub mod pick_first;
pub mod policy;
pub mod round_robin;

pub use policy::Policy;

use crate::registry::{ServerEntry, Snapshot};

/// A selection rule over a registry snapshot.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Choose a member, or `None` when the snapshot is empty.
    fn next_server<'a>(&self, snapshot: &'a Snapshot) -> Option<&'a ServerEntry>;
}

/// Run `policy` over `snapshot` and return the chosen address.
pub fn select<'a>(snapshot: &'a Snapshot, policy: Policy) -> Option<&'a str> {
    policy
        .balancer()
        .next_server(snapshot)
        .map(|entry| entry.address.as_str())
}
