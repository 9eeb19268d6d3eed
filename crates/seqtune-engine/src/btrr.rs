//! BTRR: joint reordering and round refinement with limited repetition.
//!
//! Where BTR holds the sequence fixed and sweeps round-configs, BTRR also
//! permutes the pool, capping every id at two occurrences so the space
//! stays tractable. Each `(sequence, round-config)` pair gets the same
//! global-rounds walk a BTR config does; stagnant pairs are skipped and,
//! when enabled, recorded in the failure database.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use seqtune_analyzer::aggregate_score;
use seqtune_cipher::synthesize_corpus;
use seqtune_codec::{format_profile, SequenceFormat};
use seqtune_error::{Result, TuneError};
use seqtune_perm::JointIter;
use seqtune_types::{FailureKey, InputProfile};
use tracing::info;

use crate::args::BtrArgs;
use crate::btr::{drain_new_bests, explore_round_config, resolve_result, BestFitResult, BestState, NewBest};
use crate::env::EnvPool;
use crate::evaluate::Outcome;
use crate::RunContext;

pub fn run(
    ctx: &RunContext,
    reference_sequence: &[u8],
    pool: &[u8],
    target_length: u32,
    args: &BtrArgs,
) -> Result<BestFitResult> {
    ctx.open_failure_store()?;
    let result = run_inner(ctx, reference_sequence, pool, target_length, args);
    ctx.failure_store.close()?;
    result
}

fn run_inner(
    ctx: &RunContext,
    reference_sequence: &[u8],
    pool: &[u8],
    target_length: u32,
    args: &BtrArgs,
) -> Result<BestFitResult> {
    let config = &ctx.config;
    if reference_sequence.is_empty() || pool.is_empty() {
        return Err(TuneError::parse("BTRR needs a reference sequence and a pool"));
    }
    if target_length == 0 || target_length > config.max_btrr_len {
        return Err(TuneError::FilterConflict(format!(
            "BTRR target length {target_length} outside 1..={}",
            config.max_btrr_len
        )));
    }
    let init_gr = args.starting_round.unwrap_or(1);
    let max_gr = args.max_rounds;
    if init_gr > max_gr {
        return Err(TuneError::parse(format!(
            "starting round {init_gr} exceeds max rounds {max_gr}"
        )));
    }

    let n_workers = ctx.worker_count();
    let env_pool = EnvPool::new(config.session_key);
    env_pool.prewarm(n_workers);
    let corpus = synthesize_corpus(config.input_type, config.input_size, config.corpus_seed);

    let baseline_profile = InputProfile::probe(reference_sequence, config.preferred_global_rounds());
    let baseline_sequence =
        format_profile(&ctx.registry, &baseline_profile, SequenceFormat::All, &[])?;
    let baseline_env = env_pool.rent();
    let baseline_score = match baseline_env.evaluate(&baseline_profile, &corpus) {
        Outcome::Reversible { metrics } => aggregate_score(&metrics, config.mode),
        _ => 0.0,
    };
    env_pool.give_back(baseline_env);

    let best = Mutex::new(BestState::default());
    let failure_key = FailureKey::btr(
        config.mode,
        config.input_type,
        config.exit_count,
        target_length,
        max_gr,
    );

    let (job_tx, job_rx) = mpsc::sync_channel::<(Vec<u8>, Vec<u8>)>(n_workers);
    let (newbest_tx, newbest_rx) = mpsc::channel::<NewBest>();
    let job_rx = Arc::new(Mutex::new(job_rx));

    let mut pairs_dispatched = 0u64;
    thread::scope(|scope| -> Result<()> {
        for _ in 0..n_workers {
            let job_rx = Arc::clone(&job_rx);
            let newbest_tx = newbest_tx.clone();
            let env_pool = &env_pool;
            let corpus = &corpus;
            let best = &best;
            let failure_key = &failure_key;
            scope.spawn(move || {
                while let Ok((sequence, round_config)) = {
                    let rx = job_rx.lock();
                    rx.recv()
                } {
                    explore_round_config(
                        ctx,
                        &sequence,
                        &round_config,
                        init_gr..=max_gr,
                        corpus,
                        env_pool,
                        best,
                        &newbest_tx,
                        failure_key,
                    );
                }
            });
        }
        drop(newbest_tx);

        let joint = JointIter::new(
            pool,
            target_length as usize,
            config.btrr_repetition_cap,
            config.max_tr,
        );
        for pair in joint {
            if ctx.cancel.is_canceled() {
                break;
            }
            pairs_dispatched += 1;
            job_tx
                .send(pair)
                .map_err(|_| TuneError::internal("reorder workers hung up"))?;
        }
        drop(job_tx);

        drain_new_bests(&newbest_rx, &best, Duration::from_secs(config.flush_interval_secs));
        Ok(())
    })?;

    info!(
        target: "seqtune.btrr",
        pairs = pairs_dispatched,
        target_length,
        "reorder sweep finished"
    );
    Ok(resolve_result(
        best.into_inner(),
        baseline_sequence,
        baseline_score,
    ))
}
