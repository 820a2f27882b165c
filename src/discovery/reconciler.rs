//! Periodic reconciliation of the registry against discovery.
//!
//! # Responsibilities
//! - Poll the discovery backend for healthy backend members
//! - Merge the listing into the registry through the dispatch service
//! - Survive discovery outages by skipping ticks with jittered backoff

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::config::PolicyConfig;
use crate::discovery::{DiscoveryError, ServiceDiscovery};
use crate::dispatch::DispatchService;
use crate::observability::metrics;
use crate::registry::ReconcileOutcome;
use crate::resilience::backoff::Backoff;

pub struct Reconciler {
    service: Arc<DispatchService>,
    discovery: Arc<dyn ServiceDiscovery>,
    service_name: String,
    interval: Duration,
    backoff: Backoff,
}

impl Reconciler {
    pub fn new(
        service: Arc<DispatchService>,
        discovery: Arc<dyn ServiceDiscovery>,
        service_name: impl Into<String>,
        config: &PolicyConfig,
    ) -> Self {
        Self {
            service,
            discovery,
            service_name: service_name.into(),
            interval: config.reconcile_interval(),
            backoff: Backoff::new(config.backoff_base_ms, config.backoff_max_ms),
        }
    }

    /// Run until the shutdown signal fires. The first tick runs immediately.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            service = %self.service_name,
            interval_secs = self.interval.as_secs(),
            "Reconciler starting"
        );

        let mut delay = Duration::ZERO;
        loop {
            tokio::select! {
                _ = time::sleep(delay) => {
                    delay = self.interval + self.tick_with_backoff().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Reconciler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// One tick; returns the extra delay earned by a failure.
    async fn tick_with_backoff(&mut self) -> Duration {
        match self.tick().await {
            Ok(_) => {
                if self.backoff.failures() > 0 {
                    tracing::info!(
                        failures = self.backoff.failures(),
                        "Discovery reachable again"
                    );
                }
                self.backoff.reset();
                Duration::ZERO
            }
            Err(e) => {
                let extra = self.backoff.on_failure();
                tracing::warn!(
                    service = %self.service_name,
                    error = %e,
                    failures = self.backoff.failures(),
                    retry_in = ?(self.interval + extra),
                    "Discovery query failed, keeping current registry"
                );
                extra
            }
        }
    }

    /// Query discovery, then apply the result. The registry lock is only
    /// taken after the query returns.
    pub async fn tick(&self) -> Result<ReconcileOutcome, DiscoveryError> {
        let members = match self.discovery.query_healthy(&self.service_name).await {
            Ok(members) => members,
            Err(e) => {
                metrics::record_reconcile(false);
                return Err(e);
            }
        };
        let addresses: Vec<String> = members.iter().map(|m| m.endpoint()).collect();
        metrics::record_reconcile(true);
        Ok(self.service.reconcile(&addresses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{Member, StaticDiscovery};
    use crate::lifecycle::Shutdown;
    use crate::load_balancer::Policy;

    fn config() -> PolicyConfig {
        PolicyConfig {
            reconcile_interval_secs: 1,
            backoff_base_ms: 10,
            backoff_max_ms: 50,
            ..PolicyConfig::default()
        }
    }

    #[tokio::test]
    async fn test_tick_merges_discovered_members() {
        let service = Arc::new(DispatchService::new(Policy::RoundRobin));
        service.register_server("localhost:1");
        service.report_load("localhost:1", 4);
        let discovery = Arc::new(StaticDiscovery::with_members(
            "backendserver",
            vec![Member::new("localhost", 2), Member::new("localhost", 1)],
        ));
        let reconciler = Reconciler::new(service.clone(), discovery, "backendserver", &config());

        let outcome = reconciler.tick().await.unwrap();
        assert_eq!(outcome.added, vec!["localhost:2".to_string()]);
        assert!(outcome.removed.is_empty());

        let snapshot = service.snapshot();
        let addresses: Vec<&str> = snapshot.addresses().collect();
        assert_eq!(addresses, vec!["localhost:1", "localhost:2"]);
        assert_eq!(snapshot.members[0].load, 4);
    }

    #[tokio::test]
    async fn test_failed_query_keeps_registry_and_backs_off() {
        let service = Arc::new(DispatchService::new(Policy::PickFirst));
        service.register_server("localhost:1");
        let discovery = Arc::new(StaticDiscovery::new());
        discovery.set_unavailable(true);
        let mut reconciler =
            Reconciler::new(service.clone(), discovery.clone(), "backendserver", &config());

        assert!(reconciler.tick().await.is_err());
        assert_eq!(service.snapshot().len(), 1);

        let extra = reconciler.tick_with_backoff().await;
        assert!(extra >= Duration::from_millis(10));
        assert_eq!(reconciler.backoff.failures(), 1);

        discovery.set_unavailable(false);
        assert_eq!(reconciler.tick_with_backoff().await, Duration::ZERO);
        assert_eq!(reconciler.backoff.failures(), 0);
        assert!(service.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let service = Arc::new(DispatchService::new(Policy::PickFirst));
        let discovery = Arc::new(StaticDiscovery::with_members(
            "backendserver",
            vec![Member::new("localhost", 7)],
        ));
        let shutdown = Shutdown::new();
        let reconciler = Reconciler::new(service.clone(), discovery, "backendserver", &config());
        let handle = tokio::spawn(reconciler.run(shutdown.subscribe()));

        for _ in 0..50 {
            if !service.snapshot().is_empty() {
                break;
            }
            time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(service.get_server().as_deref(), Some("localhost:7"));

        shutdown.trigger();
        time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("reconciler did not stop")
            .unwrap();
    }
}
