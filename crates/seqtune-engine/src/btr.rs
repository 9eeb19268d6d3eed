//! Best-Fit Transform Rounds: refine `(tr, gr)` around a fixed sequence.
//!
//! Each worker owns one round-config and walks the global-rounds range for
//! it, so stagnation inside a config is abandoned early without touching
//! the others. The shared high-water-mark gates "new best" reporting; the
//! authoritative best is updated inside the same critical section.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use seqtune_analyzer::{aggregate_score, truncate_score};
use seqtune_cipher::synthesize_corpus;
use seqtune_codec::{format_profile, SequenceFormat};
use seqtune_error::{Result, TuneError};
use seqtune_perm::RoundConfigIter;
use seqtune_types::{FailureKey, InputProfile, Sequence};
use tracing::{debug, info};

use crate::args::BtrArgs;
use crate::env::EnvPool;
use crate::evaluate::Outcome;
use crate::RunContext;

/// Outcome of a BTR or BTRR run.
#[derive(Debug, Clone, PartialEq)]
pub struct BestFitResult {
    pub best_sequence: String,
    pub best_score: f64,
    pub baseline_sequence: String,
    pub baseline_score: f64,
    /// Whether the search strictly beat the baseline under ten-digit
    /// normalization.
    pub improved: bool,
}

/// Shared optimizer state guarded by the best-update lock.
#[derive(Debug, Default)]
pub(crate) struct BestState {
    pub high_water_mark: f64,
    pub best_score: f64,
    pub best_sequence: Option<String>,
}

/// A "new best" log record. The stream is a log, not a contract: its
/// interleaving depends on scheduling.
pub(crate) struct NewBest {
    pub sequence: String,
    pub score: f64,
}

pub fn run(ctx: &RunContext, user_sequence: &[u8], args: &BtrArgs) -> Result<BestFitResult> {
    let config = &ctx.config;
    ctx.open_failure_store()?;
    let result = run_inner(ctx, user_sequence, args);
    ctx.failure_store.close()?;
    let result = result?;
    info!(
        target: "seqtune.btr",
        best_score = result.best_score,
        baseline = result.baseline_score,
        improved = result.improved,
        quiet = config.quiet,
        "best-fit rounds finished"
    );
    Ok(result)
}

fn run_inner(ctx: &RunContext, user_sequence: &[u8], args: &BtrArgs) -> Result<BestFitResult> {
    let config = &ctx.config;
    if user_sequence.is_empty() {
        return Err(TuneError::parse("BTR needs a non-empty sequence"));
    }
    let preferred_gr = config.preferred_global_rounds();
    let init_gr = args.starting_round.unwrap_or(preferred_gr);
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

    // Baseline: the sequence as given, all rounds at 1, preferred GR.
    let baseline_profile = InputProfile::probe(user_sequence, preferred_gr);
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
        user_sequence.len() as u32,
        max_gr,
    );

    let (job_tx, job_rx) = mpsc::sync_channel::<Vec<u8>>(n_workers);
    let (newbest_tx, newbest_rx) = mpsc::channel::<NewBest>();
    let job_rx = Arc::new(Mutex::new(job_rx));

    thread::scope(|scope| -> Result<()> {
        for _ in 0..n_workers {
            let job_rx = Arc::clone(&job_rx);
            let newbest_tx = newbest_tx.clone();
            let env_pool = &env_pool;
            let corpus = &corpus;
            let best = &best;
            let failure_key = &failure_key;
            scope.spawn(move || {
                while let Ok(round_config) = {
                    let rx = job_rx.lock();
                    rx.recv()
                } {
                    explore_round_config(
                        ctx,
                        user_sequence,
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

        for round_config in RoundConfigIter::new(user_sequence.len(), config.max_tr) {
            if ctx.cancel.is_canceled() {
                break;
            }
            job_tx
                .send(round_config)
                .map_err(|_| TuneError::internal("round-config workers hung up"))?;
        }
        drop(job_tx);

        // Status digests while workers drain; ends when the last worker
        // drops its sender.
        drain_new_bests(&newbest_rx, &best, Duration::from_secs(config.flush_interval_secs));
        Ok(())
    })?;

    let final_state = best.into_inner();
    Ok(resolve_result(
        final_state,
        baseline_sequence,
        baseline_score,
    ))
}

/// Walk the global-rounds range for one round-config.
#[allow(clippy::too_many_arguments)]
pub(crate) fn explore_round_config(
    ctx: &RunContext,
    user_sequence: &[u8],
    round_config: &[u8],
    gr_range: std::ops::RangeInclusive<u32>,
    corpus: &[u8],
    env_pool: &EnvPool,
    best: &Mutex<BestState>,
    newbest_tx: &mpsc::Sender<NewBest>,
    failure_key: &FailureKey,
) {
    let config = &ctx.config;
    let mut env = env_pool.rent();
    let mut stagnant = false;
    for gr in gr_range {
        if ctx.cancel.is_canceled() {
            break;
        }
        let profile = InputProfile::new(
            "btr",
            Sequence::from_ids_and_rounds(user_sequence, round_config),
            gr,
        );
        let score = match env.evaluate(&profile, corpus) {
            Outcome::Reversible { metrics } => aggregate_score(&metrics, config.mode),
            _ => {
                env.no_progress += 1;
                continue;
            }
        };
        if score > env.thread_best {
            env.thread_best = score;
            env.no_progress = 0;
            let mut state = best.lock();
            if score > state.high_water_mark {
                state.high_water_mark = score;
                state.best_score = score;
                let formatted =
                    format_profile(&ctx.registry, &profile, SequenceFormat::All, &[])
                        .unwrap_or_else(|_| profile.sequence.to_string());
                state.best_sequence = Some(formatted.clone());
                drop(state);
                let _ = newbest_tx.send(NewBest {
                    sequence: formatted,
                    score,
                });
            }
        } else {
            env.no_progress += 1;
            if env.no_progress >= config.exit_count {
                stagnant = true;
                break;
            }
        }
    }
    if stagnant && config.create_btr_fail_db {
        if let Err(e) = ctx.failure_store.record_bad(user_sequence, failure_key) {
            debug!(target: "seqtune.btr", error = %e, "failure record skipped");
        }
    }
    env_pool.give_back(env);
}

/// Print rate-limited digests of the new-best stream until it closes.
pub(crate) fn drain_new_bests(
    newbest_rx: &mpsc::Receiver<NewBest>,
    best: &Mutex<BestState>,
    flush_interval: Duration,
) {
    let mut since_digest = 0u64;
    loop {
        match newbest_rx.recv_timeout(flush_interval) {
            Ok(record) => {
                since_digest += 1;
                info!(
                    target: "seqtune.btr",
                    score = record.score,
                    sequence = %record.sequence,
                    "new best"
                );
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let state = best.lock();
                info!(
                    target: "seqtune.btr",
                    high_water_mark = state.high_water_mark,
                    new_bests = since_digest,
                    "status digest"
                );
                since_digest = 0;
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// Fold the search outcome against the baseline: the baseline wins ties and
/// non-improvements.
pub(crate) fn resolve_result(
    state: BestState,
    baseline_sequence: String,
    baseline_score: f64,
) -> BestFitResult {
    let improved = state.best_sequence.is_some()
        && truncate_score(state.best_score) > truncate_score(baseline_score);
    if improved {
        BestFitResult {
            // Guarded by `improved`; the sequence is always present here.
            best_sequence: state.best_sequence.unwrap_or_else(|| baseline_sequence.clone()),
            best_score: state.best_score,
            baseline_sequence,
            baseline_score,
            improved: true,
        }
    } else {
        BestFitResult {
            best_sequence: baseline_sequence.clone(),
            best_score: baseline_score,
            baseline_sequence,
            baseline_score,
            improved: false,
        }
    }
}
