//! Per-run configuration.
//!
//! One `Config` value is built at process entry and injected by reference
//! into every core; nothing in the workspace reads ambient global state.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::analysis::ScoringMode;
use crate::datatype::DataType;

/// Everything a search run needs to know, in one injectable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Longest sequence the Munge length sweep visits.
    pub max_sequence_len: u32,
    /// Per-transform rounds ceiling (`tr` upper bound).
    pub max_tr: u8,
    /// Global-rounds ceiling (`gr` upper bound).
    pub max_gr: u32,
    /// Longest sequence BTRR will realize.
    pub max_btrr_len: u32,
    /// Per-id repetition cap for BTRR joint enumeration.
    pub btrr_repetition_cap: u32,
    /// Capacity of the bounded top-N contender store.
    pub desired_contenders: usize,
    /// In-flight result count that forces a queue flush.
    pub flush_threshold: usize,
    /// Metrics that must pass before a munge result escapes failure
    /// recording.
    pub required_pass_count: u32,
    /// Consecutive no-progress iterations before a BTR round-config is
    /// declared stagnant.
    pub exit_count: u32,
    /// Record sequences that fall short during Munge sweeps.
    pub create_munge_fail_db: bool,
    /// Record stagnant pairs during BTR/BTRR runs.
    pub create_btr_fail_db: bool,
    /// Suppress per-result report lines.
    pub quiet: bool,
    /// Non-interactive operation; prompts are answered with defaults.
    pub batch: bool,
    pub mode: Option<ScoringMode>,
    pub input_type: DataType,
    /// Fixed block size of the input corpus, in bytes.
    pub input_size: usize,
    /// Seed for deterministic corpus synthesis.
    pub corpus_seed: u64,
    /// Session key the cipher derives its masks from.
    pub session_key: [u8; 32],
    /// Wall-time cadence of status digests, seconds.
    pub flush_interval_secs: u64,
    /// Checkpoint cadence, seconds. Defaults to 10 minutes in debug builds
    /// and 1 hour in release builds.
    pub checkpoint_interval_secs: u64,
    /// Progress report cadence in enumeration iterations.
    pub progress_report_iters: u64,
    /// Worker count override; `None` means one per available core.
    pub worker_count: Option<usize>,
    /// Directory that receives contender and checkpoint files.
    pub output_dir: PathBuf,
    /// Failure-database path; `None` runs with an in-memory store.
    pub fail_db_path: Option<PathBuf>,
    /// Suffix distinguishing this run's checkpoint file.
    pub state_suffix: String,
    /// Disable cutlist pruning for this run.
    pub no_cutlist: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_sequence_len: 5,
            max_tr: 9,
            max_gr: 9,
            max_btrr_len: 5,
            btrr_repetition_cap: 2,
            desired_contenders: 1000,
            flush_threshold: 200,
            required_pass_count: 6,
            exit_count: 3,
            create_munge_fail_db: false,
            create_btr_fail_db: false,
            quiet: false,
            batch: false,
            mode: Some(ScoringMode::Practical),
            input_type: DataType::Natural,
            input_size: 4096,
            corpus_seed: 0x5eb0_7041,
            session_key: [0x42; 32],
            flush_interval_secs: 120,
            checkpoint_interval_secs: if cfg!(debug_assertions) { 600 } else { 3600 },
            progress_report_iters: 20_000,
            worker_count: None,
            output_dir: PathBuf::from("."),
            fail_db_path: None,
            state_suffix: "run".to_owned(),
            no_cutlist: false,
        }
    }
}

impl Config {
    /// Preferred global rounds for the configured input type.
    #[must_use]
    pub fn preferred_global_rounds(&self) -> u32 {
        self.input_type.preferred_global_rounds()
    }

    /// Derive the sub-configuration Smart Munge uses for one data type.
    #[must_use]
    pub fn smart_munge_sub(&self, input_type: DataType) -> Self {
        Self {
            quiet: true,
            mode: None,
            batch: true,
            max_gr: 9,
            input_type,
            ..self.clone()
        }
    }
}
