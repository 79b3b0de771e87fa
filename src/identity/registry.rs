use std::collections::HashMap;

use crate::identity::hash::{fnv32a, to_base36};

/// Prefix stamped onto every generated stable id.
pub const ID_PREFIX: &str = "zen-";

#[derive(Debug, Clone)]
struct RegistryEntry {
    /// Canonical id for the signature: `zen-<base36 hash>`.
    id: String,
    /// How many times this signature has been assigned so far.
    count: u32,
}

/// Signature -> stable id bookkeeping for one page session.
///
/// Grows monotonically and is never pruned. Assignment order matters: the
/// k-th distinct element sharing a signature always receives the k-th
/// variant, so ids are deterministic within a session as long as requests
/// arrive in the same relative order.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        IdentityRegistry::default()
    }

    /// Assign a stable id for `signature`.
    ///
    /// The first request returns the canonical hash id verbatim; the Nth
    /// request (N >= 2) returns the `-N` variant. The visible suffix starts
    /// at 2, never 1 -- labels already in the wild depend on that numbering.
    pub fn assign(&mut self, signature: &str) -> String {
        let entry = self
            .entries
            .entry(signature.to_string())
            .or_insert_with(|| RegistryEntry {
                id: format!("{}{}", ID_PREFIX, to_base36(fnv32a(signature))),
                count: 0,
            });

        entry.count += 1;
        if entry.count == 1 {
            entry.id.clone()
        } else {
            format!("{}-{}", entry.id, entry.count)
        }
    }

    /// How many times `signature` has been assigned.
    pub fn occurrences(&self, signature: &str) -> u32 {
        self.entries.get(signature).map(|e| e.count).unwrap_or(0)
    }

    /// Number of distinct signatures seen.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
