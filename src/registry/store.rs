//! Authoritative backend membership and load table.
//!
//! # Responsibilities
//! - Track address -> load for every known backend
//! - Keep the first-seen rotation order consistent with the entry set
//! - Hold the round-robin cursor between selections
//! - Merge discovery results without disturbing reported loads

use std::collections::{HashMap, HashSet};

use crate::error::DispatchError;
use crate::registry::entry::ServerEntry;

/// Result of merging a discovery listing into the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Addresses appended to the rotation.
    pub added: Vec<String>,
    /// Addresses dropped because discovery no longer lists them.
    pub removed: Vec<String>,
}

impl ReconcileOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Backend registry.
///
/// Invariant: `order` holds exactly the keys of `entries`, without duplicates.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, ServerEntry>,
    order: Vec<String>,
    cursor: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an address with zero load if absent.
    ///
    /// Returns `true` when the entry was created by this call.
    pub fn upsert(&mut self, address: &str) -> bool {
        if self.entries.contains_key(address) {
            return false;
        }
        self.entries
            .insert(address.to_string(), ServerEntry::new(address));
        self.order.push(address.to_string());
        true
    }

    /// Overwrite the load of a known address.
    pub fn set_load(&mut self, address: &str, load: u64) -> Result<(), DispatchError> {
        match self.entries.get_mut(address) {
            Some(entry) => {
                entry.load = load;
                Ok(())
            }
            None => Err(DispatchError::UnknownServer(address.to_string())),
        }
    }

    /// Make the member set equal to `discovered`.
    ///
    /// Surviving members keep their load and relative order; new addresses
    /// are appended in the order given, with zero load. The cursor keeps
    /// pointing at the same member when it survives, otherwise at the member
    /// that followed it, wrapping to the front.
    pub fn reconcile(&mut self, discovered: &[String]) -> ReconcileOutcome {
        let wanted: HashSet<&str> = discovered.iter().map(String::as_str).collect();
        let mut outcome = ReconcileOutcome::default();

        let mut removed_before_cursor = 0;
        let mut kept = Vec::with_capacity(self.order.len());
        for (index, address) in self.order.drain(..).enumerate() {
            if wanted.contains(address.as_str()) {
                kept.push(address);
            } else {
                if index < self.cursor {
                    removed_before_cursor += 1;
                }
                self.entries.remove(&address);
                outcome.removed.push(address);
            }
        }
        self.order = kept;
        self.cursor -= removed_before_cursor;
        if self.cursor >= self.order.len() {
            self.cursor = 0;
        }

        for address in discovered {
            if self.upsert(address) {
                outcome.added.push(address.clone());
            }
        }

        outcome
    }

    /// Copy the current state for policy evaluation.
    pub fn snapshot(&self) -> Snapshot {
        let members = self
            .order
            .iter()
            .filter_map(|address| self.entries.get(address))
            .cloned()
            .collect();
        Snapshot {
            members,
            cursor: self.cursor,
        }
    }

    /// Move the round-robin cursor one step, wrapping at the member count.
    pub fn advance_cursor(&mut self) {
        if self.order.is_empty() {
            self.cursor = 0;
        } else {
            self.cursor = (self.cursor + 1) % self.order.len();
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn load_of(&self, address: &str) -> Option<u64> {
        self.entries.get(address).map(|entry| entry.load)
    }

    /// Addresses in rotation order.
    pub fn addresses(&self) -> &[String] {
        &self.order
    }
}

/// Immutable copy of the registry taken under the lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Members in rotation order.
    pub members: Vec<ServerEntry>,
    /// Round-robin position at the time of the snapshot.
    pub cursor: usize,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|entry| entry.address.as_str())
    }
}
