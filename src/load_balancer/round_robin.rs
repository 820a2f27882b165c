//! Round-robin load balancing strategy.

use crate::load_balancer::LoadBalancer;
use crate::registry::{ServerEntry, Snapshot};

/// Round-robin selector.
/// Reads the cursor stored in the snapshot; the dispatch service advances it.
#[derive(Debug, Default)]
pub struct RoundRobin;

impl RoundRobin {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server<'a>(&self, snapshot: &'a Snapshot) -> Option<&'a ServerEntry> {
        if snapshot.is_empty() {
            return None;
        }
        snapshot.members.get(snapshot.cursor % snapshot.len())
    }
}
