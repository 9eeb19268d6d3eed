//! Weighted aggregation and cross-platform score normalization.

use seqtune_types::{AnalysisResult, ScoringMode};

/// Weighted sum of metric scores under the given mode.
///
/// `None` falls back to [`ScoringMode::Practical`]; sub-runs that disable
/// mode selection still need a total order over contenders.
#[must_use]
pub fn aggregate_score(results: &[AnalysisResult], mode: Option<ScoringMode>) -> f64 {
    let mode = mode.unwrap_or_default();
    results
        .iter()
        .map(|r| mode.weight(r.metric) * r.score)
        .sum()
}

/// Number of metrics that passed their thresholds.
#[must_use]
pub fn pass_count(results: &[AnalysisResult]) -> u32 {
    results.iter().filter(|r| r.passed).count() as u32
}

/// Truncate to ten decimal digits.
///
/// Improvement decisions compare scores produced on different threads and
/// possibly different machines; truncation keeps the comparison stable
/// against sub-epsilon float drift.
#[must_use]
pub fn truncate_score(score: f64) -> f64 {
    (score * 1e10).trunc() / 1e10
}

#[cfg(test)]
mod tests {
    use seqtune_types::MetricKind;

    use super::*;

    fn res(metric: MetricKind, score: f64, passed: bool) -> AnalysisResult {
        AnalysisResult {
            metric,
            value: score,
            threshold: 0.5,
            passed,
            score,
            notes: None,
        }
    }

    #[test]
    fn aggregate_respects_mode_weights() {
        let results = vec![
            res(MetricKind::Entropy, 1.0, true),
            res(MetricKind::Avalanche, 0.0, false),
        ];
        let practical = aggregate_score(&results, Some(ScoringMode::Practical));
        assert!((practical - 0.15).abs() < 1e-12);
        let flat = aggregate_score(&results, Some(ScoringMode::Exploratory));
        assert!((flat - 1.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn pass_count_counts_passes() {
        let results = vec![
            res(MetricKind::Entropy, 1.0, true),
            res(MetricKind::Correlation, 0.2, false),
            res(MetricKind::Avalanche, 0.9, true),
        ];
        assert_eq!(pass_count(&results), 2);
    }

    #[test]
    fn truncation_is_stable_under_tiny_drift() {
        let a = 0.123_456_789_012_3;
        let b = a + 1e-13;
        assert_eq!(truncate_score(a), truncate_score(b));
        assert!(truncate_score(0.5) < truncate_score(0.5 + 1e-9));
    }
}
