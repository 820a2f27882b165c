//! Least-load balancing strategy.

use crate::load_balancer::LoadBalancer;
use crate::registry::{ServerEntry, Snapshot};

/// Least load selector.
/// Selects the member with the lowest reported load.
#[derive(Debug, Default)]
pub struct LeastLoad;

impl LeastLoad {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastLoad {
    fn next_server<'a>(&self, snapshot: &'a Snapshot) -> Option<&'a ServerEntry> {
        // min_by_key keeps the first minimum, so ties go to the earliest member
        snapshot.members.iter().min_by_key(|entry| entry.load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::test_support::snapshot;

    #[test]
    fn test_least_load_breaks_ties_by_order() {
        let lb = LeastLoad::new();
        let snap = snapshot(&[("A", 5), ("B", 2), ("C", 2)], 0);
        assert_eq!(lb.next_server(&snap).unwrap().address, "B");
    }

    #[test]
    fn test_least_load_follows_reports() {
        let lb = LeastLoad::new();
        let snap = snapshot(&[("127.0.0.1:8080", 3), ("127.0.0.1:8081", 0)], 0);
        assert_eq!(lb.next_server(&snap).unwrap().address, "127.0.0.1:8081");

        let snap = snapshot(&[("127.0.0.1:8080", 3), ("127.0.0.1:8081", 5)], 0);
        assert_eq!(lb.next_server(&snap).unwrap().address, "127.0.0.1:8080");
    }

    #[test]
    fn test_least_load_empty() {
        assert!(LeastLoad::new().next_server(&Snapshot::default()).is_none());
    }
}
