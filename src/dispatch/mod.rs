//! Dispatch service subsystem.
//!
//! # Data Flow
//! ```text
//! POST /register     → DispatchService::register_server → Registry::upsert
//! POST /report-load  → DispatchService::report_load     → Registry::set_load
//! POST /get-server   → DispatchService::select          → snapshot + select + advance
//! Reconciler tick    → DispatchService::reconcile       → Registry::reconcile
//! ```
//!
//! # Design Decisions
//! - The service is the only owner of the registry
//! - One mutex serializes all four operations; readers and writers are not
//!   distinguished
//! - Unknown servers and empty registries are answers, not faults

pub mod protocol;
pub mod service;

pub use service::DispatchService;
