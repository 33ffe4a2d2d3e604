//! Destination dedup policy.
//!
//! When dedup is on, every inserted mapping carries a [`DedupKey`] derived
//! from its destination (and, for [`DedupScope::PerOwner`], its owner). The
//! store holds a unique index on that key, so two racing creates for the same
//! destination cannot both succeed.

use sha2::{Digest, Sha256};
use std::fmt::Display;

/// Which mappings share a destination for dedup purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupScope {
    /// Every create inserts a new mapping.
    #[default]
    Off,
    /// One mapping per destination across all owners.
    Global,
    /// One mapping per destination per owner.
    PerOwner,
}

impl DedupScope {
    /// Returns the unique key a new mapping must carry, if dedup is on.
    pub fn key_for(&self, destination: &str, owner_id: u64) -> Option<DedupKey> {
        match self {
            DedupScope::Off => None,
            DedupScope::Global => Some(DedupKey::digest(&["global", destination])),
            DedupScope::PerOwner => Some(DedupKey::digest(&[
                "owner",
                &owner_id.to_string(),
                destination,
            ])),
        }
    }

    /// The owner filter to apply when looking up an existing mapping.
    pub fn lookup_owner(&self, owner_id: u64) -> Option<u64> {
        match self {
            DedupScope::PerOwner => Some(owner_id),
            DedupScope::Off | DedupScope::Global => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, DedupScope::Off)
    }
}

/// Hex-encoded SHA-256 over the scope-qualified destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey(String);

impl DedupKey {
    fn digest(parts: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            // Separator keeps ("ab", "c") distinct from ("a", "bc").
            hasher.update([0u8]);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DedupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex-encoded SHA-256 of a destination, used as an index-friendly lookup key.
pub fn destination_digest(destination: &str) -> String {
    format!("{:x}", Sha256::digest(destination.as_bytes()))
}
