//! Statistical cryptanalysis of candidate ciphertext.
//!
//! The cores hand three buffers to an analyzer: the encrypted payload, an
//! avalanche difference (ciphertext XOR ciphertext-of-one-flipped-input-bit)
//! and a key-dependency difference (ciphertext XOR
//! ciphertext-under-one-flipped-key-bit). The analyzer grades them on nine
//! metrics and the scorer folds the results into one weighted aggregate.

pub mod metrics;
pub mod report;
pub mod score;

use seqtune_error::Result;
use seqtune_types::AnalysisResult;

pub use metrics::{MetricAnalyzer, Thresholds};
pub use score::{aggregate_score, pass_count, truncate_score};

/// The narrow interface the search cores see.
pub trait SequenceAnalyzer: Send + Sync {
    /// Grade one evaluation's buffers. Implementations return one
    /// [`AnalysisResult`] per metric, in a stable order.
    fn analyze(
        &self,
        payload: &[u8],
        avalanche: &[u8],
        keydep: &[u8],
    ) -> Result<Vec<AnalysisResult>>;
}
