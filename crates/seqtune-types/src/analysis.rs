//! Metric results and scoring-mode weight tables.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of metrics a full evaluation produces.
pub const METRIC_COUNT: usize = 9;

/// The nine statistical cryptanalysis metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    Entropy,
    BitVariance,
    SlidingWindow,
    FrequencyDistribution,
    Periodicity,
    Correlation,
    PositionalMapping,
    Avalanche,
    KeyDependency,
}

impl MetricKind {
    /// Evaluation order; also the order metric blocks appear in reports.
    pub const ALL: [Self; METRIC_COUNT] = [
        Self::Entropy,
        Self::BitVariance,
        Self::SlidingWindow,
        Self::FrequencyDistribution,
        Self::Periodicity,
        Self::Correlation,
        Self::PositionalMapping,
        Self::Avalanche,
        Self::KeyDependency,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Entropy => "Entropy",
            Self::BitVariance => "Bit Variance",
            Self::SlidingWindow => "Sliding Window",
            Self::FrequencyDistribution => "Frequency Distribution",
            Self::Periodicity => "Periodicity",
            Self::Correlation => "Correlation",
            Self::PositionalMapping => "Positional Mapping",
            Self::Avalanche => "Avalanche",
            Self::KeyDependency => "Key Dependency",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One metric's outcome for a single evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub metric: MetricKind,
    /// Raw measured value, in the metric's own unit.
    pub value: f64,
    /// Pass threshold the raw value is judged against.
    pub threshold: f64,
    pub passed: bool,
    /// Normalized score in `[0, 1]` fed into the weighted aggregate.
    pub score: f64,
    pub notes: Option<String>,
}

/// Weight table selector for aggregate scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoringMode {
    /// Balanced weights favoring the diffusion metrics.
    #[default]
    Practical,
    /// Flat weights; used when hunting for unusual candidates.
    Exploratory,
}

impl ScoringMode {
    /// Single-letter token for filenames and failure keys.
    #[must_use]
    pub fn token(self) -> char {
        match self {
            Self::Practical => 'P',
            Self::Exploratory => 'E',
        }
    }

    /// Weight applied to a metric's normalized score.
    ///
    /// Practical weights sum to 1.0 across [`MetricKind::ALL`].
    #[must_use]
    pub fn weight(self, metric: MetricKind) -> f64 {
        match self {
            Self::Exploratory => 1.0 / METRIC_COUNT as f64,
            Self::Practical => match metric {
                MetricKind::Entropy => 0.15,
                MetricKind::BitVariance => 0.10,
                MetricKind::SlidingWindow => 0.10,
                MetricKind::FrequencyDistribution => 0.10,
                MetricKind::Periodicity => 0.10,
                MetricKind::Correlation => 0.10,
                MetricKind::PositionalMapping => 0.05,
                MetricKind::Avalanche => 0.15,
                MetricKind::KeyDependency => 0.15,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn practical_weights_sum_to_one() {
        let sum: f64 = MetricKind::ALL
            .iter()
            .map(|&m| ScoringMode::Practical.weight(m))
            .sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn exploratory_weights_are_flat() {
        for m in MetricKind::ALL {
            assert!((ScoringMode::Exploratory.weight(m) - 1.0 / 9.0).abs() < 1e-12);
        }
    }
}
