//! Pick-first strategy.

use crate::load_balancer::LoadBalancer;
use crate::registry::{ServerEntry, Snapshot};

/// Always returns the earliest-seen member, ignoring load.
#[derive(Debug, Default)]
pub struct PickFirst;

impl LoadBalancer for PickFirst {
    fn next_server<'a>(&self, snapshot: &'a Snapshot) -> Option<&'a ServerEntry> {
        snapshot.members.first()
    }
}
