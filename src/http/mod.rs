//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (assign request ID, open span)
//!     → server.rs (dispatch routes) or backend::server (work route)
//!     → JSON response
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::DispatchServer;
