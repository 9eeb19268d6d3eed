//! Checkpoint snapshots for Munge resume.
//!
//! One state file exists per `max_sequence_len` value. Writes go to a
//! sibling temp file and rename into place, so a resumed run sees either
//! the old snapshot or the new one, never a torn mix. A present-but-
//! unparsable snapshot downgrades to a warning and a fresh start.

use std::fs;
use std::path::{Path, PathBuf};

use seqtune_error::{Result, TuneError};
use seqtune_types::Contender;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// The resumable state of one Munge length sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MungeState {
    /// Length being swept when the snapshot was taken.
    pub length: u32,
    /// The filtered pool in effect for that length.
    pub transforms: Vec<u8>,
    /// The sequence being evaluated at snapshot time; resume re-executes it.
    pub sequence: Vec<u8>,
    /// Contender table at snapshot time.
    pub contenders: Vec<Contender>,
}

/// `State,-L<MaxLen>-<suffix>.json`
#[must_use]
pub fn state_file_name(max_sequence_len: u32, suffix: &str) -> String {
    format!("State,-L{max_sequence_len}-{suffix}.json")
}

/// Atomically persist a snapshot for the given `max_sequence_len`.
pub fn save_state(
    dir: &Path,
    max_sequence_len: u32,
    suffix: &str,
    state: &MungeState,
) -> Result<PathBuf> {
    let path = dir.join(state_file_name(max_sequence_len, suffix));
    let tmp = path.with_extension("json.tmp");
    let body = serde_json::to_vec_pretty(state)
        .map_err(|e| TuneError::internal(format!("serialize checkpoint: {e}")))?;
    fs::write(&tmp, body)?;
    fs::rename(&tmp, &path)?;
    info!(
        target: "seqtune.checkpoint",
        path = %path.display(),
        length = state.length,
        contenders = state.contenders.len(),
        "checkpoint written"
    );
    Ok(path)
}

/// Load a snapshot if one exists.
///
/// `Ok(None)` covers both "no file" and "file corrupt"; corruption is
/// logged and the sweep starts fresh rather than aborting the run.
pub fn load_state(dir: &Path, max_sequence_len: u32, suffix: &str) -> Result<Option<MungeState>> {
    let path = dir.join(state_file_name(max_sequence_len, suffix));
    if !path.exists() {
        return Ok(None);
    }
    let body = fs::read(&path)?;
    match serde_json::from_slice::<MungeState>(&body) {
        Ok(state) => Ok(Some(state)),
        Err(e) => {
            warn!(
                target: "seqtune.checkpoint",
                path = %path.display(),
                error = %e,
                "checkpoint corrupt, starting fresh"
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use seqtune_types::{AnalysisResult, MetricKind};

    use super::*;

    fn state() -> MungeState {
        MungeState {
            length: 3,
            transforms: vec![10, 11, 12],
            sequence: vec![10, 12, 11],
            contenders: vec![Contender {
                sequence: vec![10, 12, 11],
                aggregate_score: 0.75,
                metrics: vec![AnalysisResult {
                    metric: MetricKind::Entropy,
                    value: 7.9,
                    threshold: 7.8,
                    passed: true,
                    score: 0.98,
                    notes: None,
                }],
                pass_count: 1,
            }],
        }
    }

    #[test]
    fn save_then_load_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let original = state();
        save_state(dir.path(), 5, "test", &original).unwrap();
        let restored = load_state(dir.path(), 5, "test").unwrap().unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_state(dir.path(), 5, "test").unwrap().is_none());
    }

    #[test]
    fn corrupt_snapshot_degrades_to_fresh_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(state_file_name(5, "test"));
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(load_state(dir.path(), 5, "test").unwrap().is_none());
    }

    #[test]
    fn snapshots_are_separated_by_max_len() {
        let dir = tempfile::tempdir().unwrap();
        save_state(dir.path(), 4, "test", &state()).unwrap();
        assert!(load_state(dir.path(), 5, "test").unwrap().is_none());
        assert!(load_state(dir.path(), 4, "test").unwrap().is_some());
    }

    #[test]
    fn no_temp_file_survives_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_state(dir.path(), 5, "test", &state()).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
