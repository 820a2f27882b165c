//! Server registry subsystem.
//!
//! # Data Flow
//! ```text
//! RegisterServer ──▶ upsert()    ──┐
//! ReportLoad     ──▶ set_load()  ──┼──▶ Registry (entries + order + cursor)
//! Reconciler     ──▶ reconcile() ──┘            │
//!                                               ▼
//! GetServer ◀── load_balancer::select() ◀── snapshot()
//! ```
//!
//! # Design Decisions
//! - `order` is the only source of iteration order; `entries` is for lookup
//! - First-seen order survives removals, new members append
//! - The registry itself is not synchronized; the dispatch service owns it
//!   behind a single mutex

pub mod entry;
pub mod store;

pub use entry::ServerEntry;
pub use store::{ReconcileOutcome, Registry, Snapshot};
