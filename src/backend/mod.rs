//! Backend worker subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     → register with discovery (backend service name)
//!     → RegisterServer on the dispatcher
//!     → spawn reporter.rs
//!
//! Client work:
//!     POST /process → server.rs → in_flight.rs guard held for the request
//!
//! reporter.rs, every interval:
//!     in_flight.current() → ReportLoad
//!     → success=false → RegisterServer again
//! ```

pub mod in_flight;
pub mod reporter;
pub mod server;

pub use in_flight::{InFlight, InFlightGuard};
pub use reporter::{LoadReporter, ReportOutcome};
pub use server::BackendServer;
