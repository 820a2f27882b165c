//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Discovery query or load report fails:
//!     → backoff.rs (extend the next wait by a jittered exponential delay)
//!     → success resets the streak
//! ```
//!
//! # Design Decisions
//! - Failures never stop a loop; they only slow it down
//! - Delays are jittered and capped at `backoff_max_ms`

pub mod backoff;
