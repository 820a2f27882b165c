//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Resolve policy → Register with discovery
//!     → Spawn reconciler / reporter → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop loops → Drain HTTP → Deregister → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then background tasks, then listener
//! - An invalid policy is the only configuration error found after parsing

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Dispatcher, StartupError, Worker};
