//! The nine metric computations.
//!
//! Each metric reports a raw `value` in its own unit, the `threshold` it is
//! judged against, a pass verdict, and a normalized `score` in `[0, 1]`
//! where 1 is indistinguishable-from-random. Pass direction varies per
//! metric (some want large values, some small); the verdict is computed
//! here so downstream code never re-derives it.

use seqtune_error::{Result, TuneError};
use seqtune_types::{AnalysisResult, MetricKind};

use crate::SequenceAnalyzer;

/// Ideal mean of a uniform byte distribution.
const UNIFORM_MEAN: f64 = 127.5;
/// Chi-square expectation for 255 degrees of freedom.
const CHI2_EXPECTED: f64 = 255.0;
/// 95th percentile of the chi-square distribution at 255 degrees.
const CHI2_THRESHOLD: f64 = 293.25;

const WINDOW_SIZE: usize = 64;
const MAX_LAG: usize = 32;

/// Pass thresholds for the nine metrics. The defaults are the reference
/// strictness; a run may tighten or relax them. Several scores normalize
/// against their threshold, so verdicts and scores move together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Minimum Shannon entropy, bits per byte.
    pub entropy: f64,
    /// Maximum deviation of the ones-ratio from one half.
    pub bit_deviation: f64,
    /// Maximum mean relative deviation of window means.
    pub window: f64,
    /// Maximum chi-square statistic over the byte histogram.
    pub chi_square: f64,
    /// Maximum absolute autocorrelation over short lags.
    pub periodicity: f64,
    /// Maximum absolute lag-1 serial correlation.
    pub correlation: f64,
    /// Maximum mean quartile-to-global histogram distance.
    pub positional: f64,
    /// Maximum deviation of a difference buffer's flip ratio from one half.
    pub diffusion_tolerance: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            entropy: 7.8,
            bit_deviation: 0.01,
            window: 0.05,
            chi_square: CHI2_THRESHOLD,
            periodicity: 0.06,
            correlation: 0.05,
            positional: 0.08,
            diffusion_tolerance: 0.02,
        }
    }
}

/// The reference analyzer.
#[derive(Debug, Clone, Default)]
pub struct MetricAnalyzer {
    thresholds: Thresholds,
}

impl MetricAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }
}

impl SequenceAnalyzer for MetricAnalyzer {
    fn analyze(
        &self,
        payload: &[u8],
        avalanche: &[u8],
        keydep: &[u8],
    ) -> Result<Vec<AnalysisResult>> {
        if payload.is_empty() {
            return Err(TuneError::MetricAnalysis("empty payload buffer".into()));
        }
        let t = &self.thresholds;
        Ok(vec![
            entropy(payload, t),
            bit_variance(payload, t),
            sliding_window(payload, t),
            frequency_distribution(payload, t),
            periodicity(payload, t),
            correlation(payload, t),
            positional_mapping(payload, t),
            diffusion(MetricKind::Avalanche, avalanche, t),
            diffusion(MetricKind::KeyDependency, keydep, t),
        ])
    }
}

fn result(
    metric: MetricKind,
    value: f64,
    threshold: f64,
    passed: bool,
    score: f64,
    notes: Option<String>,
) -> AnalysisResult {
    AnalysisResult {
        metric,
        value,
        threshold,
        passed,
        score: score.clamp(0.0, 1.0),
        notes,
    }
}

fn byte_histogram(payload: &[u8]) -> [u64; 256] {
    let mut histogram = [0u64; 256];
    for &b in payload {
        histogram[b as usize] += 1;
    }
    histogram
}

fn ones_ratio(buf: &[u8]) -> f64 {
    if buf.is_empty() {
        return 0.0;
    }
    let ones: u64 = buf.iter().map(|b| u64::from(b.count_ones())).sum();
    ones as f64 / (buf.len() as f64 * 8.0)
}

/// Shannon entropy in bits per byte; wants high.
fn entropy(payload: &[u8], t: &Thresholds) -> AnalysisResult {
    let histogram = byte_histogram(payload);
    let n = payload.len() as f64;
    let mut bits = 0.0;
    for &count in &histogram {
        if count > 0 {
            let p = count as f64 / n;
            bits -= p * p.log2();
        }
    }
    result(
        MetricKind::Entropy,
        bits,
        t.entropy,
        bits >= t.entropy,
        bits / 8.0,
        None,
    )
}

/// Deviation of the global ones-ratio from one half; wants small.
fn bit_variance(payload: &[u8], t: &Thresholds) -> AnalysisResult {
    let deviation = (ones_ratio(payload) - 0.5).abs();
    result(
        MetricKind::BitVariance,
        deviation,
        t.bit_deviation,
        deviation <= t.bit_deviation,
        1.0 - 2.0 * deviation,
        None,
    )
}

/// Mean relative deviation of fixed-window means from the uniform mean;
/// wants small. Catches locally-skewed output that global statistics miss.
fn sliding_window(payload: &[u8], t: &Thresholds) -> AnalysisResult {
    let windows: Vec<f64> = payload
        .chunks(WINDOW_SIZE)
        .filter(|w| w.len() == WINDOW_SIZE)
        .map(|w| w.iter().map(|&b| f64::from(b)).sum::<f64>() / WINDOW_SIZE as f64)
        .collect();
    let value = if windows.is_empty() {
        // Blocks shorter than one window fall back to the global mean.
        let mean = payload.iter().map(|&b| f64::from(b)).sum::<f64>() / payload.len() as f64;
        (mean - UNIFORM_MEAN).abs() / UNIFORM_MEAN
    } else {
        windows
            .iter()
            .map(|m| (m - UNIFORM_MEAN).abs() / UNIFORM_MEAN)
            .sum::<f64>()
            / windows.len() as f64
    };
    result(
        MetricKind::SlidingWindow,
        value,
        t.window,
        value <= t.window,
        1.0 - value / (2.0 * t.window),
        None,
    )
}

/// Chi-square statistic over the byte histogram; wants near 255.
fn frequency_distribution(payload: &[u8], t: &Thresholds) -> AnalysisResult {
    let histogram = byte_histogram(payload);
    let expected = payload.len() as f64 / 256.0;
    let chi2: f64 = histogram
        .iter()
        .map(|&count| {
            let diff = count as f64 - expected;
            diff * diff / expected
        })
        .sum();
    result(
        MetricKind::FrequencyDistribution,
        chi2,
        t.chi_square,
        chi2 <= t.chi_square,
        1.0 - ((chi2 - CHI2_EXPECTED).abs() / (4.0 * CHI2_EXPECTED)),
        Some(format!("expected ~{CHI2_EXPECTED:.0} for uniform bytes")),
    )
}

/// Largest absolute autocorrelation over short lags; wants small.
fn periodicity(payload: &[u8], t: &Thresholds) -> AnalysisResult {
    let value = (1..=MAX_LAG.min(payload.len().saturating_sub(2)))
        .map(|lag| autocorrelation(payload, lag).abs())
        .fold(0.0f64, f64::max);
    result(
        MetricKind::Periodicity,
        value,
        t.periodicity,
        value <= t.periodicity,
        1.0 - value / (2.0 * t.periodicity),
        None,
    )
}

/// Lag-1 serial correlation; wants small.
fn correlation(payload: &[u8], t: &Thresholds) -> AnalysisResult {
    let value = autocorrelation(payload, 1).abs();
    result(
        MetricKind::Correlation,
        value,
        t.correlation,
        value <= t.correlation,
        1.0 - value / (2.0 * t.correlation),
        None,
    )
}

/// Mean total-variation distance between quartile histograms and the global
/// histogram; wants small. A transform that maps input regions to output
/// regions leaves quartiles with distinct byte populations.
fn positional_mapping(payload: &[u8], t: &Thresholds) -> AnalysisResult {
    let n = payload.len();
    let quarter = (n / 4).max(1);
    let global = normalized_histogram(payload);
    let mut distance = 0.0;
    let mut quartiles = 0u32;
    for chunk in payload.chunks(quarter).take(4) {
        let local = normalized_histogram(chunk);
        let tv: f64 = global
            .iter()
            .zip(&local)
            .map(|(g, l)| (g - l).abs())
            .sum::<f64>()
            / 2.0;
        distance += tv;
        quartiles += 1;
    }
    let value = distance / f64::from(quartiles.max(1));
    result(
        MetricKind::PositionalMapping,
        value,
        t.positional,
        value <= t.positional,
        1.0 - value / (2.0 * t.positional),
        None,
    )
}

/// Set-bit ratio of a difference buffer; wants one half. Used for both the
/// avalanche and key-dependency passes.
fn diffusion(metric: MetricKind, difference: &[u8], t: &Thresholds) -> AnalysisResult {
    if difference.is_empty() {
        return result(
            metric,
            0.0,
            0.5,
            false,
            0.0,
            Some("difference buffer missing".to_owned()),
        );
    }
    let ratio = ones_ratio(difference);
    let deviation = (ratio - 0.5).abs();
    result(
        metric,
        ratio,
        0.5,
        deviation <= t.diffusion_tolerance,
        1.0 - 2.0 * deviation,
        Some(format!("flip ratio {ratio:.4}, ideal 0.5000")),
    )
}

fn normalized_histogram(buf: &[u8]) -> Vec<f64> {
    let histogram = byte_histogram(buf);
    let n = buf.len().max(1) as f64;
    histogram.iter().map(|&c| c as f64 / n).collect()
}

/// Pearson autocorrelation of the byte stream at the given lag.
fn autocorrelation(payload: &[u8], lag: usize) -> f64 {
    if payload.len() <= lag + 1 {
        return 0.0;
    }
    let n = payload.len() - lag;
    let mean = payload.iter().map(|&b| f64::from(b)).sum::<f64>() / payload.len() as f64;
    let mut num = 0.0;
    let mut den = 0.0;
    for &b in payload {
        den += (f64::from(b) - mean).powi(2);
    }
    if den == 0.0 {
        // Constant buffer: perfectly predictable.
        return 1.0;
    }
    for i in 0..n {
        num += (f64::from(payload[i]) - mean) * (f64::from(payload[i + lag]) - mean);
    }
    num / den
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_bytes(len: usize) -> Vec<u8> {
        // Deterministic high-entropy filler from a small LCG.
        let mut state = 0x9e37u16;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(31).wrapping_add(0x6d2b);
                (state >> 8) as u8
            })
            .collect()
    }

    #[test]
    fn constant_buffer_fails_the_statistical_metrics() {
        let analyzer = MetricAnalyzer::new();
        let payload = vec![0xAAu8; 4096];
        let results = analyzer.analyze(&payload, &payload, &payload).unwrap();

        let by_kind = |k: MetricKind| results.iter().find(|r| r.metric == k).unwrap();
        assert!(!by_kind(MetricKind::Entropy).passed);
        assert!(!by_kind(MetricKind::FrequencyDistribution).passed);
        assert!(!by_kind(MetricKind::Periodicity).passed);
        assert!(by_kind(MetricKind::Entropy).score < 0.2);
    }

    #[test]
    fn spread_buffer_scores_high_on_entropy_and_frequency() {
        let analyzer = MetricAnalyzer::new();
        // Every byte value equally often: maximal entropy, flat histogram.
        let payload: Vec<u8> = (0..4096).map(|i| (i % 256) as u8).collect();
        let results = analyzer.analyze(&payload, &payload, &payload).unwrap();
        let by_kind = |k: MetricKind| results.iter().find(|r| r.metric == k).unwrap();
        assert!(by_kind(MetricKind::Entropy).passed);
        assert!(by_kind(MetricKind::Entropy).score > 0.95);
        // Perfectly periodic input is flagged by the periodicity metric.
        assert!(!by_kind(MetricKind::Periodicity).passed);
    }

    #[test]
    fn balanced_difference_passes_diffusion() {
        let half_set = vec![0x0Fu8; 512];
        let r = diffusion(MetricKind::Avalanche, &half_set, &Thresholds::default());
        assert!(r.passed);
        assert!((r.value - 0.5).abs() < 1e-9);
        assert!(r.score > 0.99);
    }

    #[test]
    fn skewed_difference_fails_diffusion() {
        let sparse = vec![0x01u8; 512];
        let r = diffusion(MetricKind::KeyDependency, &sparse, &Thresholds::default());
        assert!(!r.passed);
        assert!(r.score < 0.8);
    }

    #[test]
    fn every_analysis_reports_all_nine_metrics_in_order() {
        let analyzer = MetricAnalyzer::new();
        let payload = uniform_bytes(2048);
        let results = analyzer.analyze(&payload, &payload, &payload).unwrap();
        let kinds: Vec<MetricKind> = results.iter().map(|r| r.metric).collect();
        assert_eq!(kinds, MetricKind::ALL.to_vec());
        for r in &results {
            assert!((0.0..=1.0).contains(&r.score), "{:?}", r.metric);
        }
    }

    #[test]
    fn empty_payload_is_an_analysis_error() {
        let analyzer = MetricAnalyzer::new();
        assert!(analyzer.analyze(&[], &[], &[]).is_err());
    }

    #[test]
    fn relaxed_thresholds_change_verdicts() {
        let payload: Vec<u8> = (0..4096).map(|i| (i % 256) as u8).collect();
        let strict = MetricAnalyzer::new()
            .analyze(&payload, &payload, &payload)
            .unwrap();
        let relaxed = MetricAnalyzer::with_thresholds(Thresholds {
            periodicity: 1.5,
            ..Thresholds::default()
        })
        .analyze(&payload, &payload, &payload)
        .unwrap();

        let pick = |rs: &[AnalysisResult]| {
            rs.iter()
                .find(|r| r.metric == MetricKind::Periodicity)
                .cloned()
                .unwrap()
        };
        assert!(!pick(&strict).passed);
        assert!(pick(&relaxed).passed);
        assert_eq!(pick(&strict).value, pick(&relaxed).value);
    }
}
