//! One candidate evaluation: round-trip, difference buffers, analysis.

use seqtune_analyzer::SequenceAnalyzer;
use seqtune_cipher::Cipher;
use seqtune_types::{AnalysisResult, InputProfile};

/// What one evaluation produced. A sum type instead of exceptions: every
/// arm is an expected, handleable result of probing a candidate.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Decrypt reproduced the input; metrics were computed.
    Reversible { metrics: Vec<AnalysisResult> },
    /// Decrypt did not reproduce the input. Always recorded as bad.
    NotReversible,
    /// The analyzer rejected the buffers.
    AnalyzerError(String),
    /// The worker panicked; captured, never propagated.
    WorkerPanic(String),
}

/// Bit flipped in the input for the avalanche pass: the middle byte's low
/// bit, so the flip sits away from block edges.
fn flip_input_bit(input: &[u8]) -> Vec<u8> {
    let mut flipped = input.to_vec();
    if !flipped.is_empty() {
        let mid = flipped.len() / 2;
        flipped[mid] ^= 0x01;
    }
    flipped
}

fn xor_diff(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}

/// Run the full evaluation pipeline for one profile against one input
/// block: encrypt, verify the decrypt round-trip, derive the avalanche and
/// key-dependency differences, and analyze.
pub fn evaluate(
    cipher: &Cipher,
    keydep_cipher: &Cipher,
    analyzer: &dyn SequenceAnalyzer,
    profile: &InputProfile,
    input: &[u8],
) -> Outcome {
    let payload = match cipher.encrypt(profile, input) {
        Ok(p) => p,
        Err(e) => return Outcome::AnalyzerError(e.to_string()),
    };
    match cipher.decrypt(profile, &payload) {
        Ok(decrypted) if decrypted == input => {}
        Ok(_) => return Outcome::NotReversible,
        Err(_) => return Outcome::NotReversible,
    }

    let avalanche = match cipher.encrypt(profile, &flip_input_bit(input)) {
        Ok(flipped) => xor_diff(&payload, &flipped),
        Err(e) => return Outcome::AnalyzerError(e.to_string()),
    };
    let keydep = match keydep_cipher.encrypt(profile, input) {
        Ok(other_key) => xor_diff(&payload, &other_key),
        Err(e) => return Outcome::AnalyzerError(e.to_string()),
    };

    match analyzer.analyze(&payload, &avalanche, &keydep) {
        Ok(metrics) => Outcome::Reversible { metrics },
        Err(e) => Outcome::AnalyzerError(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use seqtune_analyzer::MetricAnalyzer;
    use seqtune_cipher::registry::ids;
    use seqtune_types::METRIC_COUNT;

    use super::*;

    #[test]
    fn reference_transforms_evaluate_reversible() {
        let cipher = Cipher::new([3u8; 32]);
        let keydep = cipher.with_flipped_key_bit(0);
        let analyzer = MetricAnalyzer::new();
        let input: Vec<u8> = (0..=255u8).cycle().take(2048).collect();
        let profile = InputProfile::probe(&[ids::MASK_ADD, ids::CHAIN_FORWARD], 3);
        match evaluate(&cipher, &keydep, &analyzer, &profile, &input) {
            Outcome::Reversible { metrics } => assert_eq!(metrics.len(), METRIC_COUNT),
            other => panic!("expected reversible, got {other:?}"),
        }
    }

    #[test]
    fn unknown_transform_surfaces_as_analyzer_error() {
        let cipher = Cipher::new([3u8; 32]);
        let keydep = cipher.with_flipped_key_bit(0);
        let profile = InputProfile::probe(&[200], 1);
        let outcome = evaluate(&cipher, &keydep, &MetricAnalyzer::new(), &profile, &[0u8; 64]);
        assert!(matches!(outcome, Outcome::AnalyzerError(_)));
    }
}
