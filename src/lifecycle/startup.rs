//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the policy and discovery client from validated configuration
//! - Register the process with the discovery backend
//! - Start background tasks (reconciler, load reporter)
//! - Serve until shutdown, then withdraw the registration
//!
//! # Design Decisions
//! - Fail fast on configuration errors (unknown policy, bad discovery URL)
//! - Discovery and dispatcher being unreachable at startup is not fatal;
//!   the periodic loops catch up once they are back

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::backend::{BackendServer, LoadReporter};
use crate::client::{ClientError, DispatchClient};
use crate::config::{ConfigError, DiscoveryConfig, DispatchConfig};
use crate::discovery::{
    ConsulDiscovery, DiscoveryError, Member, Reconciler, ServiceDiscovery, ServiceRegistration,
};
use crate::dispatch::DispatchService;
use crate::error::DispatchError;
use crate::http::DispatchServer;
use crate::lifecycle::Shutdown;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("configuration error: {0}")]
    Policy(#[from] DispatchError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The configured discovery client, or `None` when discovery is disabled.
pub fn build_discovery(
    config: &DiscoveryConfig,
) -> Result<Option<Arc<dyn ServiceDiscovery>>, DiscoveryError> {
    if !config.enabled {
        return Ok(None);
    }
    let consul: Arc<dyn ServiceDiscovery> = Arc::new(ConsulDiscovery::from_config(config)?);
    Ok(Some(consul))
}

fn member_for(addr: &str) -> Option<Member> {
    match addr.parse::<SocketAddr>() {
        Ok(sock) => Some(Member::new(sock.ip().to_string(), sock.port())),
        Err(_) => Member::parse(addr),
    }
}

/// Announce `address` under `service_name`. Failures are logged.
async fn announce(
    discovery: &dyn ServiceDiscovery,
    service_name: &str,
    address: &str,
    check_interval: Duration,
) -> Option<ServiceRegistration> {
    let Some(member) = member_for(address) else {
        tracing::warn!(address = %address, "Cannot register malformed address with discovery");
        return None;
    };
    let registration = ServiceRegistration::new(service_name, member, check_interval);
    match discovery.register(&registration).await {
        Ok(()) => Some(registration),
        Err(e) => {
            tracing::warn!(service = %service_name, error = %e, "Discovery registration failed");
            None
        }
    }
}

async fn withdraw(discovery: &dyn ServiceDiscovery, registration: Option<ServiceRegistration>) {
    if let Some(registration) = registration {
        if let Err(e) = discovery.deregister(&registration.service_id()).await {
            tracing::warn!(error = %e, "Discovery deregistration failed");
        }
    }
}

/// A fully wired dispatch service process.
pub struct Dispatcher {
    config: DispatchConfig,
    service: Arc<DispatchService>,
    discovery: Option<Arc<dyn ServiceDiscovery>>,
}

impl Dispatcher {
    /// Resolve the policy once; an unknown name stops startup here.
    pub fn new(config: DispatchConfig) -> Result<Self, StartupError> {
        let service = Arc::new(DispatchService::from_config(&config.dispatch)?);
        let discovery = build_discovery(&config.discovery)?;
        Ok(Self {
            config,
            service,
            discovery,
        })
    }

    /// Replace the configured discovery backend.
    pub fn with_discovery(mut self, discovery: Arc<dyn ServiceDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub fn service(&self) -> Arc<DispatchService> {
        self.service.clone()
    }

    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), StartupError> {
        let local = listener.local_addr()?.to_string();
        let check_interval = Duration::from_secs(self.config.discovery.health_check_interval_secs);

        let mut registration = None;
        if let Some(discovery) = &self.discovery {
            registration = announce(
                discovery.as_ref(),
                &self.config.discovery.dispatcher_service,
                &local,
                check_interval,
            )
            .await;

            let reconciler = Reconciler::new(
                self.service.clone(),
                discovery.clone(),
                self.config.discovery.backend_service.clone(),
                &self.config.dispatch,
            );
            tokio::spawn(reconciler.run(shutdown.subscribe()));
        } else {
            tracing::info!("Discovery disabled, membership comes from explicit registration only");
        }

        let server = DispatchServer::new(&self.config, self.service.clone());
        let served = server.run(listener, shutdown.subscribe()).await;

        if let Some(discovery) = &self.discovery {
            withdraw(discovery.as_ref(), registration).await;
        }
        Ok(served?)
    }
}

/// A fully wired backend worker process.
pub struct Worker {
    config: DispatchConfig,
    discovery: Option<Arc<dyn ServiceDiscovery>>,
}

impl Worker {
    pub fn new(config: DispatchConfig) -> Result<Self, StartupError> {
        let discovery = build_discovery(&config.discovery)?;
        Ok(Self { config, discovery })
    }

    pub fn with_discovery(mut self, discovery: Arc<dyn ServiceDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), StartupError> {
        let backend = &self.config.backend;
        let address = backend.advertised(&listener.local_addr()?.to_string());
        let timeout = Duration::from_secs(self.config.timeouts.request_secs);
        let check_interval = Duration::from_secs(self.config.discovery.health_check_interval_secs);

        let mut registration = None;
        if let Some(discovery) = &self.discovery {
            registration = announce(
                discovery.as_ref(),
                &self.config.discovery.backend_service,
                &address,
                check_interval,
            )
            .await;
        }

        let server = BackendServer::new(timeout);
        let client = DispatchClient::with_timeout(&backend.dispatcher_url, timeout)?;
        match client.register(&address).await {
            Ok(true) => tracing::info!(address = %address, dispatcher = %client.base(), "Registered with dispatcher"),
            Ok(false) => tracing::error!(address = %address, "Dispatcher refused registration"),
            Err(e) => tracing::warn!(error = %e, "Dispatcher unreachable, reporter will retry registration"),
        }

        let reporter = LoadReporter::new(client, address, server.in_flight(), backend.report_interval());
        tokio::spawn(reporter.run(shutdown.subscribe()));

        let served = server.run(listener, shutdown.subscribe()).await;

        if let Some(discovery) = &self.discovery {
            withdraw(discovery.as_ref(), registration).await;
        }
        Ok(served?)
    }
}
