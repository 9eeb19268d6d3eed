//! Deterministic failure-key encoding.
//!
//! A sequence is recorded as bad *under a context*, not globally. The key is
//! a stable fingerprint of that context: the same inputs always produce the
//! same string, across runs and processes, so rows written by one run prune
//! work in the next.

use serde::{Deserialize, Serialize};

use crate::analysis::ScoringMode;
use crate::datatype::DataType;

/// Context fingerprint under which a sequence's bad-ness is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FailureKey {
    pub mode: Option<ScoringMode>,
    pub data_type: DataType,
    /// Which search pass produced the record, e.g. `standard` or `btr`.
    pub methodology: String,
    pub exit_count: u32,
    pub pass_count: u32,
    pub global_rounds_ceiling: u32,
    pub length: u32,
    pub scope_ceiling: u32,
}

impl FailureKey {
    /// Key for a standard Munge sweep at the given length.
    #[must_use]
    pub fn munge(
        mode: Option<ScoringMode>,
        data_type: DataType,
        pass_count: u32,
        length: u32,
        global_rounds_ceiling: u32,
    ) -> Self {
        Self {
            mode,
            data_type,
            methodology: "standard".to_owned(),
            exit_count: 0,
            pass_count,
            global_rounds_ceiling,
            length,
            scope_ceiling: 0,
        }
    }

    /// Key for BTR/BTRR stagnation records.
    #[must_use]
    pub fn btr(
        mode: Option<ScoringMode>,
        data_type: DataType,
        exit_count: u32,
        length: u32,
        global_rounds_ceiling: u32,
    ) -> Self {
        Self {
            mode,
            data_type,
            methodology: "btr".to_owned(),
            exit_count,
            pass_count: 0,
            global_rounds_ceiling,
            length,
            scope_ceiling: 0,
        }
    }

    /// The opaque persisted form.
    ///
    /// Field order is part of the on-disk contract; never reorder.
    #[must_use]
    pub fn encode(&self) -> String {
        let mode = self.mode.map_or('-', ScoringMode::token);
        format!(
            "M{mode}-D{}-T{}-E{}-P{}-G{}-L{}-S{}",
            self.data_type.token(),
            self.methodology,
            self.exit_count,
            self.pass_count,
            self.global_rounds_ceiling,
            self.length,
            self.scope_ceiling,
        )
    }
}
