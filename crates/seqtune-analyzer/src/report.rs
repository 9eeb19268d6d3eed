//! Contender-file rendering and append.
//!
//! The per-length contender file is plain text, one block per contender,
//! strictly ordered by the canonical ranking. The block layout and the
//! filename pattern are an external contract consumed by downstream query
//! tooling; change neither.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use seqtune_error::Result;
use seqtune_types::{Contender, DataType, ScoringMode, METRIC_COUNT};
use tracing::info;

/// `Contenders,-L<len>-P<pass>-D<typ>-M<mode>-S<score>.txt`
#[must_use]
pub fn contender_file_name(
    length: u32,
    required_pass_count: u32,
    data_type: DataType,
    mode: Option<ScoringMode>,
    top_score: f64,
) -> String {
    let mode = mode.map_or('-', ScoringMode::token);
    format!(
        "Contenders,-L{length}-P{required_pass_count}-D{}-M{mode}-S{top_score:.4}.txt",
        data_type.token()
    )
}

/// Render one contender block. `rank` is 1-based.
#[must_use]
pub fn render_contender_block(rank: usize, formatted_sequence: &str, contender: &Contender) -> String {
    let mut out = String::new();
    out.push_str(&format!("Contender #{rank}:\n"));
    out.push_str(&format!("Sequence: {formatted_sequence}\n"));
    out.push_str(&format!(
        "Aggregate Score: {:.4}\n",
        contender.aggregate_score
    ));
    out.push_str(&format!(
        "Pass Count: {} / {METRIC_COUNT}\n",
        contender.pass_count
    ));
    out.push_str("Scores:\n");
    for metric in &contender.metrics {
        let verdict = if metric.passed { "PASS" } else { "FAIL" };
        out.push_str(&format!("- {}: {verdict}\n", metric.metric));
        out.push_str(&format!(
            "  Metric: {:.4}, Threshold: {:.4}\n",
            metric.value, metric.threshold
        ));
        if let Some(notes) = &metric.notes {
            out.push_str(&format!("  Notes: {notes}\n"));
        }
    }
    out.push('\n');
    out
}

/// Append rendered blocks for a length sweep's top contenders.
///
/// `entries` pairs each contender with its formatted sequence, already in
/// canonical rank order. Returns the file path written.
pub fn append_contender_file(
    dir: &Path,
    file_name: &str,
    entries: &[(String, Contender)],
) -> Result<PathBuf> {
    let path = dir.join(file_name);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    for (rank, (formatted, contender)) in entries.iter().enumerate() {
        file.write_all(render_contender_block(rank + 1, formatted, contender).as_bytes())?;
    }
    file.flush()?;
    info!(
        target: "seqtune.report",
        path = %path.display(),
        contenders = entries.len(),
        "appended contender file"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use seqtune_types::{AnalysisResult, MetricKind};

    use super::*;

    fn contender() -> Contender {
        Contender {
            sequence: vec![10, 18],
            aggregate_score: 0.87654,
            metrics: vec![AnalysisResult {
                metric: MetricKind::Entropy,
                value: 7.91,
                threshold: 7.8,
                passed: true,
                score: 0.99,
                notes: Some("high".to_owned()),
            }],
            pass_count: 1,
        }
    }

    #[test]
    fn block_layout_matches_the_contract() {
        let block = render_contender_block(1, "MaskAdd -> Riffle", &contender());
        let expected = "Contender #1:\n\
                        Sequence: MaskAdd -> Riffle\n\
                        Aggregate Score: 0.8765\n\
                        Pass Count: 1 / 9\n\
                        Scores:\n\
                        - Entropy: PASS\n\
                        \x20 Metric: 7.9100, Threshold: 7.8000\n\
                        \x20 Notes: high\n\n";
        assert_eq!(block, expected);
    }

    #[test]
    fn file_name_encodes_the_run_context() {
        let name = contender_file_name(3, 6, DataType::Natural, Some(ScoringMode::Practical), 0.91);
        assert_eq!(name, "Contenders,-L3-P6-DN-MP-S0.9100.txt");
        let bare = contender_file_name(2, 6, DataType::Random, None, 0.5);
        assert_eq!(bare, "Contenders,-L2-P6-DR-M--S0.5000.txt");
    }

    #[test]
    fn append_writes_blocks_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![
            ("A".to_owned(), contender()),
            ("B".to_owned(), contender()),
        ];
        let path = append_contender_file(dir.path(), "Contenders,-test.txt", &entries).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("Contender #1:\nSequence: A"));
        assert!(text.contains("Contender #2:\nSequence: B"));
    }
}
