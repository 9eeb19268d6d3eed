//! Transform metadata as seen by the search cores.
//!
//! The registry maps an `id` to this record; the kernels that actually move
//! bytes live in `seqtune-cipher`. Per-transform rounds are *not* part of
//! the metadata; they travel inside each [`crate::InputProfile`].

use serde::{Deserialize, Serialize};

/// Static description of one reversible byte-level transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Stable identifier used in sequences, filenames, and the failure store.
    pub id: u8,
    /// Human-readable name; must be unique within a registry.
    pub name: String,
    /// Identifier of the inverse transform. `inverse_id == id` marks a
    /// self-inverse.
    pub inverse_id: u8,
    /// Excluded transforms never enter the permutable pool.
    pub excluded: bool,
    /// Measured cost of one application over the reference block, used for
    /// sweep time estimates.
    pub benchmark_ms: f64,
}

impl Transform {
    /// Whether this transform is its own inverse.
    #[must_use]
    pub fn is_self_inverse(&self) -> bool {
        self.inverse_id == self.id
    }
}
