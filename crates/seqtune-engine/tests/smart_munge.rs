//! The full Smart Munge pipeline on a deliberately small configuration.

use seqtune_cipher::TransformRegistry;
use seqtune_engine::{orchestrator, RunContext};
use seqtune_types::{Config, DataType};

#[test]
fn smart_munge_covers_every_data_type_and_reorders_each_table() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        max_sequence_len: 1,
        input_size: 128,
        worker_count: Some(2),
        quiet: true,
        no_cutlist: true,
        desired_contenders: 50,
        checkpoint_interval_secs: 3600,
        output_dir: dir.path().to_owned(),
        ..Config::default()
    };
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let registry = TransformRegistry::reference();
    let permutable = registry.iter_permutable();
    let ctx = RunContext::new(config, registry).unwrap();

    let report = orchestrator::smart_munge(&ctx).unwrap();

    assert!(!report.canceled);
    let types: Vec<DataType> = report.outcomes.iter().map(|o| o.input_type).collect();
    assert_eq!(types, DataType::SMART_MUNGE_ORDER.to_vec());

    for outcome in &report.outcomes {
        // A length-1 sweep over the permutable pool always finds
        // reversible candidates.
        assert!(!outcome.contenders.is_empty(), "{}", outcome.input_type);
        assert!(!outcome.candidate_pool.is_empty());
        for id in &outcome.candidate_pool {
            assert!(permutable.contains(id));
        }
        let best_fit = outcome.best_fit.as_ref().unwrap();
        assert!(best_fit.best_score >= best_fit.baseline_score);
    }
}
