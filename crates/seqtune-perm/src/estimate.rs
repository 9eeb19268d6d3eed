//! Sweep wall-time estimation from per-transform benchmark timings.

/// Every candidate costs four cipher passes: encrypt, decrypt, avalanche,
/// and key-dependency.
pub const EVALUATION_PASSES: f64 = 4.0;

/// Projected cost of one enumeration sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepEstimate {
    pub total_sequences: u64,
    pub estimated_ms: f64,
    pub avg_per_sequence_ms: f64,
}

/// Estimate a sweep from the pool's benchmark timings.
///
/// Transforms are drawn uniformly across emissions, so the per-sequence cost
/// is the pool's mean benchmark time scaled by sequence length, input size
/// factor, global rounds, and the four evaluation passes.
#[must_use]
pub fn estimate_sweep(
    pool_benchmark_ms: &[f64],
    length: u32,
    total_sequences: u64,
    input_size_factor: f64,
    global_rounds: u32,
) -> SweepEstimate {
    let mean = if pool_benchmark_ms.is_empty() {
        0.0
    } else {
        pool_benchmark_ms.iter().sum::<f64>() / pool_benchmark_ms.len() as f64
    };
    let avg_per_sequence_ms =
        mean * f64::from(length) * input_size_factor * f64::from(global_rounds) * EVALUATION_PASSES;
    SweepEstimate {
        total_sequences,
        estimated_ms: avg_per_sequence_ms * total_sequences as f64,
        avg_per_sequence_ms,
    }
}
