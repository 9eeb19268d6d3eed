//! Shared data model for the seqtune workspace.
//!
//! Everything that crosses a crate boundary lives here: transform metadata,
//! sequences and their round annotations, input profiles, analysis results,
//! contenders, data-type tokens, scoring modes, and the per-run [`Config`]
//! record that replaces ambient global state.

pub mod analysis;
pub mod config;
pub mod contender;
pub mod datatype;
pub mod failure_key;
pub mod profile;
pub mod sequence;
pub mod transform;

pub use analysis::{AnalysisResult, MetricKind, ScoringMode, METRIC_COUNT};
pub use config::Config;
pub use contender::Contender;
pub use datatype::DataType;
pub use failure_key::FailureKey;
pub use profile::InputProfile;
pub use sequence::{Sequence, SequenceStep};
pub use transform::Transform;

/// Terminal color attached to user-visible summaries.
///
/// `Red` is fatal, `Yellow` is a recoverable warning, `Green` is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StatusColor {
    Red,
    Yellow,
    Green,
}

impl StatusColor {
    /// Process exit code mandated for this severity.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Green => 0,
            Self::Red => 1,
            // User aborts surface as yellow summaries.
            Self::Yellow => 2,
        }
    }
}
