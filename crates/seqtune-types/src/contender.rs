//! Contenders: sequences whose aggregate score earned a slot in the top-N.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;

/// A scored sequence, as held by the contender store and checkpoint files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contender {
    /// Bare transform ids; round annotations are not part of identity.
    pub sequence: Vec<u8>,
    /// Weighted sum over metric scores under the active scoring mode.
    pub aggregate_score: f64,
    pub metrics: Vec<AnalysisResult>,
    /// How many metrics passed their thresholds.
    pub pass_count: u32,
}

impl Contender {
    /// Canonical ranking: score desc, then pass count desc, then sequence
    /// lexicographic asc. Total because scores are compared with `total_cmp`.
    #[must_use]
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .aggregate_score
            .total_cmp(&self.aggregate_score)
            .then_with(|| other.pass_count.cmp(&self.pass_count))
            .then_with(|| self.sequence.cmp(&other.sequence))
    }

    /// Whether this contender strictly outranks `other` for store eviction
    /// decisions: `(score, pass_count)` lexicographic.
    #[must_use]
    pub fn beats(&self, other: &Self) -> bool {
        match self.aggregate_score.total_cmp(&other.aggregate_score) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self.pass_count > other.pass_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contender(seq: &[u8], score: f64, pass: u32) -> Contender {
        Contender {
            sequence: seq.to_vec(),
            aggregate_score: score,
            metrics: Vec::new(),
            pass_count: pass,
        }
    }

    #[test]
    fn serde_round_trips_a_contender() {
        let original = contender(&[10, 12], 0.8125, 7);
        let json = serde_json::to_string(&original).unwrap();
        let restored: Contender = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn rank_orders_by_score_then_pass_then_sequence() {
        let mut v = vec![
            contender(&[2], 0.5, 3),
            contender(&[1], 0.5, 3),
            contender(&[9], 0.9, 1),
            contender(&[3], 0.5, 7),
        ];
        v.sort_by(Contender::rank_cmp);
        let seqs: Vec<_> = v.iter().map(|c| c.sequence[0]).collect();
        assert_eq!(seqs, vec![9, 3, 1, 2]);
    }
}
