//! In-process discovery backend.
//!
//! Keeps registrations in memory. Used by embedders that manage membership
//! themselves and in tests, where `set_unavailable` simulates an unreachable
//! directory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::discovery::{DiscoveryError, Member, ServiceDiscovery, ServiceRegistration};

#[derive(Debug, Default)]
pub struct StaticDiscovery {
    /// service name -> (service id, member), in registration order.
    services: Mutex<HashMap<String, Vec<(String, Member)>>>,
    unavailable: AtomicBool,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a service with a fixed member list.
    pub fn with_members(service_name: &str, members: Vec<Member>) -> Self {
        let discovery = Self::new();
        {
            let mut services = discovery.services.lock().expect("discovery mutex poisoned");
            let list = services.entry(service_name.to_string()).or_default();
            for member in members {
                let registration = ServiceRegistration::new(service_name, member, Duration::ZERO);
                list.push((registration.service_id(), registration.member));
            }
        }
        discovery
    }

    /// Make every call fail until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), DiscoveryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DiscoveryError::Unavailable("static discovery marked unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ServiceDiscovery for StaticDiscovery {
    async fn register(&self, registration: &ServiceRegistration) -> Result<(), DiscoveryError> {
        self.check_available()?;
        let id = registration.service_id();
        let mut services = self.services.lock().expect("discovery mutex poisoned");
        let list = services.entry(registration.service_name.clone()).or_default();
        match list.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = registration.member.clone(),
            None => list.push((id, registration.member.clone())),
        }
        Ok(())
    }

    async fn deregister(&self, service_id: &str) -> Result<(), DiscoveryError> {
        self.check_available()?;
        let mut services = self.services.lock().expect("discovery mutex poisoned");
        for list in services.values_mut() {
            list.retain(|(id, _)| id != service_id);
        }
        Ok(())
    }

    async fn query_healthy(&self, service_name: &str) -> Result<Vec<Member>, DiscoveryError> {
        self.check_available()?;
        let services = self.services.lock().expect("discovery mutex poisoned");
        Ok(services
            .get(service_name)
            .map(|list| list.iter().map(|(_, member)| member.clone()).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(port: u16) -> ServiceRegistration {
        ServiceRegistration::new("backendserver", Member::new("localhost", port), Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_register_query_deregister() {
        let discovery = StaticDiscovery::new();
        discovery.register(&registration(1)).await.unwrap();
        discovery.register(&registration(2)).await.unwrap();
        discovery.register(&registration(1)).await.unwrap();

        let members = discovery.query_healthy("backendserver").await.unwrap();
        assert_eq!(members, vec![Member::new("localhost", 1), Member::new("localhost", 2)]);

        discovery.deregister("backendserver-localhost-1").await.unwrap();
        let members = discovery.query_healthy("backendserver").await.unwrap();
        assert_eq!(members, vec![Member::new("localhost", 2)]);

        assert!(discovery.query_healthy("other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seeded_members_deregister_by_service_id() {
        let discovery = StaticDiscovery::with_members(
            "backendserver",
            vec![Member::new("localhost", 1), Member::new("localhost", 2)],
        );
        discovery.deregister(&registration(1).service_id()).await.unwrap();
        assert_eq!(
            discovery.query_healthy("backendserver").await.unwrap(),
            vec![Member::new("localhost", 2)]
        );
    }

    #[tokio::test]
    async fn test_unavailable() {
        let discovery = StaticDiscovery::with_members("svc", vec![Member::new("h", 1)]);
        discovery.set_unavailable(true);
        assert!(matches!(
            discovery.query_healthy("svc").await,
            Err(DiscoveryError::Unavailable(_))
        ));
        discovery.set_unavailable(false);
        assert_eq!(discovery.query_healthy("svc").await.unwrap().len(), 1);
    }
}
