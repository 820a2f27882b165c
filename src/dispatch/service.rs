//! The dispatch service: registry ownership and the request-facing operations.
//!
//! Every operation takes the registry mutex exactly once and does only
//! in-memory work while holding it. Discovery queries and remote calls
//! happen outside, in the reconciler and the transport.

use std::sync::{Mutex, MutexGuard};

use crate::config::PolicyConfig;
use crate::dispatch::protocol::StatusReport;
use crate::error::DispatchError;
use crate::load_balancer::{self, Policy};
use crate::observability::metrics;
use crate::registry::{ReconcileOutcome, Registry, Snapshot};

#[derive(Debug)]
pub struct DispatchService {
    registry: Mutex<Registry>,
    policy: Policy,
}

impl DispatchService {
    pub fn new(policy: Policy) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            policy,
        }
    }

    /// Build from configuration, rejecting an unknown policy name.
    pub fn from_config(config: &PolicyConfig) -> Result<Self, DispatchError> {
        Ok(Self::new(config.policy.parse()?))
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().expect("registry mutex poisoned")
    }

    /// RegisterServer. Idempotent; only a blank address is refused. The
    /// address is stored as given, so ReportLoad must use the same string.
    pub fn register_server(&self, address: &str) -> bool {
        if address.trim().is_empty() {
            tracing::warn!("Rejected registration with empty address");
            return false;
        }

        let (created, members) = {
            let mut registry = self.registry();
            (registry.upsert(address), registry.len())
        };
        if created {
            tracing::info!(address = %address, "Registered server");
            metrics::record_registered_servers(members);
        } else {
            tracing::debug!(address = %address, "Server already registered");
        }
        true
    }

    /// ReportLoad. `false` tells the backend it is unknown and should register.
    pub fn report_load(&self, address: &str, load: u64) -> bool {
        let result = self.registry().set_load(address, load);
        match result {
            Ok(()) => {
                tracing::debug!(address = %address, load, "Updated load");
                metrics::record_load_report(true);
                true
            }
            Err(e) => {
                tracing::warn!(address = %address, load, error = %e, "Load report rejected");
                metrics::record_load_report(false);
                false
            }
        }
    }

    /// GetServer. Selection and cursor advance share one critical section.
    pub fn select(&self) -> Result<String, DispatchError> {
        let chosen = {
            let mut registry = self.registry();
            let snapshot = registry.snapshot();
            let chosen = load_balancer::select(&snapshot, self.policy).map(str::to_string);
            if chosen.is_some() && self.policy.rotates() {
                registry.advance_cursor();
            }
            chosen
        };

        match chosen {
            Some(address) => {
                tracing::info!(address = %address, policy = %self.policy, "Assigned server");
                metrics::record_selection(self.policy, true);
                Ok(address)
            }
            None => {
                tracing::warn!(policy = %self.policy, "No servers available");
                metrics::record_selection(self.policy, false);
                Err(DispatchError::NoServersAvailable)
            }
        }
    }

    /// GetServer as seen by callers: `None` means try again later.
    pub fn get_server(&self) -> Option<String> {
        self.select().ok()
    }

    /// Replace membership with a discovery listing.
    pub fn reconcile(&self, discovered: &[String]) -> ReconcileOutcome {
        let (outcome, members) = {
            let mut registry = self.registry();
            let outcome = registry.reconcile(discovered);
            (outcome, registry.len())
        };
        if !outcome.is_unchanged() {
            tracing::info!(
                added = ?outcome.added,
                removed = ?outcome.removed,
                members,
                "Reconciled registry with discovery"
            );
        }
        metrics::record_registered_servers(members);
        outcome
    }

    pub fn snapshot(&self) -> Snapshot {
        self.registry().snapshot()
    }

    pub fn status(&self) -> StatusReport {
        let snapshot = self.snapshot();
        StatusReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            policy: self.policy.to_string(),
            cursor: snapshot.cursor,
            servers: snapshot.members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_from_config_rejects_unknown_policy() {
        let mut config = PolicyConfig::default();
        config.policy = "Weighted".into();
        assert_eq!(
            DispatchService::from_config(&config).unwrap_err(),
            DispatchError::InvalidPolicy("Weighted".into())
        );
    }

    #[test]
    fn test_register_is_idempotent() {
        let service = DispatchService::new(Policy::PickFirst);
        assert!(service.register_server("a:1"));
        assert!(service.register_server("a:1"));
        assert_eq!(service.snapshot().len(), 1);
        assert!(!service.register_server("  "));
    }

    #[test]
    fn test_padded_address_reports_under_the_registered_key() {
        let service = DispatchService::new(Policy::LeastLoad);
        assert!(service.register_server("a:1 "));
        assert!(service.report_load("a:1 ", 3));

        let snapshot = service.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.members[0].address, "a:1 ");
        assert_eq!(snapshot.members[0].load, 3);
        assert!(!service.report_load("a:1", 5), "lookup is exact");
    }

    #[test]
    fn test_report_load_unknown_returns_false_without_mutation() {
        let service = DispatchService::new(Policy::LeastLoad);
        service.register_server("a:1");
        let before = service.snapshot();
        assert!(!service.report_load("b:1", 3));
        assert_eq!(service.snapshot(), before);
    }

    #[test]
    fn test_empty_registry_returns_none() {
        for policy in Policy::ALL {
            let service = DispatchService::new(policy);
            assert_eq!(service.get_server(), None);
            assert_eq!(service.select(), Err(DispatchError::NoServersAvailable));
        }
    }

    #[test]
    fn test_round_robin_cycles_in_first_seen_order() {
        let service = DispatchService::new(Policy::RoundRobin);
        let members = ["a:1", "b:1", "c:1"];
        for m in members {
            service.register_server(m);
        }
        let picks: Vec<String> = (0..members.len())
            .filter_map(|_| service.get_server())
            .collect();
        assert_eq!(picks, members);
        assert_eq!(service.get_server().as_deref(), Some("a:1"));
    }

    #[test]
    fn test_pick_first_is_stable() {
        let service = DispatchService::new(Policy::PickFirst);
        service.register_server("a:1");
        service.register_server("b:1");
        service.report_load("a:1", 100);
        for _ in 0..5 {
            assert_eq!(service.get_server().as_deref(), Some("a:1"));
        }
    }

    #[test]
    fn test_least_load_end_to_end() {
        let service = DispatchService::new(Policy::LeastLoad);
        service.register_server("A");
        service.register_server("B");
        assert!(service.report_load("A", 3));
        assert_eq!(service.get_server().as_deref(), Some("B"));
        assert!(service.report_load("B", 5));
        assert_eq!(service.get_server().as_deref(), Some("A"));
    }

    #[test]
    fn test_reconcile_then_round_robin_stays_in_bounds() {
        let service = DispatchService::new(Policy::RoundRobin);
        for m in ["a:1", "b:1", "c:1"] {
            service.register_server(m);
        }
        service.get_server();
        service.get_server();
        service.reconcile(&["a:1".to_string(), "b:1".to_string()]);
        assert_eq!(service.get_server().as_deref(), Some("a:1"));
        assert_eq!(service.get_server().as_deref(), Some("b:1"));
    }

    #[test]
    fn test_removed_server_comes_back_with_zero_load() {
        let service = DispatchService::new(Policy::LeastLoad);
        service.register_server("a:1");
        service.report_load("a:1", 8);
        service.reconcile(&[]);
        assert!(!service.report_load("a:1", 2));
        service.register_server("a:1");
        assert_eq!(service.snapshot().members[0].load, 0);
    }

    #[test]
    fn test_concurrent_round_robin_hands_out_each_slot_once() {
        let service = Arc::new(DispatchService::new(Policy::RoundRobin));
        for i in 0..4 {
            service.register_server(&format!("s:{}", i));
        }
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                std::thread::spawn(move || {
                    (0..100).filter_map(|_| service.get_server()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts = std::collections::HashMap::new();
        for handle in handles {
            for address in handle.join().unwrap() {
                *counts.entry(address).or_insert(0) += 1;
            }
        }
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&n| n == 200));
    }
}
