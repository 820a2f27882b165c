//! Load-aware request dispatch.
//!
//! A dispatch service keeps a registry of backend workers and their
//! self-reported load, reconciles it against a service directory, and
//! names a target backend for each client using a fixed policy. Clients
//! then send their work straight to that backend.

pub mod backend;
pub mod client;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod registry;
pub mod resilience;

pub use config::DispatchConfig;
pub use dispatch::DispatchService;
pub use error::DispatchError;
pub use lifecycle::Shutdown;
pub use load_balancer::Policy;
