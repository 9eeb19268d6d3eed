//! Input profiles: the unit of execution handed to the cipher.

use serde::{Deserialize, Serialize};

use crate::sequence::Sequence;

/// The bundle `{sequence, tr[], gr}` the cipher executes.
///
/// Produced by the profiler or synthesized by the search cores; the per-step
/// `tr` values live inside [`Sequence`], global rounds alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputProfile {
    pub name: String,
    pub sequence: Sequence,
    pub global_rounds: u32,
}

impl InputProfile {
    #[must_use]
    pub fn new(name: impl Into<String>, sequence: Sequence, global_rounds: u32) -> Self {
        Self {
            name: name.into(),
            sequence,
            global_rounds,
        }
    }

    /// Synthesize the unannotated probe profile used by exhaustive sweeps:
    /// every `tr` is 1 and `gr` is the caller's preferred value.
    #[must_use]
    pub fn probe(ids: &[u8], global_rounds: u32) -> Self {
        Self::new("probe", Sequence::from_ids(ids), global_rounds)
    }
}
