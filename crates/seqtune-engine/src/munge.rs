//! The exhaustive-permutation Munge pass.
//!
//! Outer loop over sequence lengths, inner lazy enumeration of every
//! filtered permutation at that length. Each candidate is probed with
//! `tr = [1, 1, …]` and the input type's preferred global rounds, graded,
//! and offered to the contender store; sequences that fail the round-trip
//! are recorded in the failure database and pruned from future runs.
//! Checkpoints make a length sweep resumable at the exact sequence it was
//! interrupted on.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use seqtune_analyzer::report::{append_contender_file, contender_file_name};
use seqtune_analyzer::{aggregate_score, pass_count};
use seqtune_cipher::synthesize_corpus;
use seqtune_codec::{format_profile, SequenceFormat};
use seqtune_error::Result;
use seqtune_perm::{estimate_sweep, PermutationPlan};
use seqtune_store::checkpoint::{load_state, save_state, MungeState};
use seqtune_types::{Contender, FailureKey, InputProfile, StatusColor};
use tracing::{error, info, warn};

use crate::args::MungeArgs;
use crate::env::EnvPool;
use crate::evaluate::Outcome;
use crate::progress::ProgressTracker;
use crate::RunContext;

/// Block size the benchmark timings were measured against.
const REFERENCE_INPUT_SIZE: usize = 4096;

/// What one Munge invocation did.
#[derive(Debug, Default)]
pub struct MungeSummary {
    pub message: String,
    pub lengths_completed: Vec<u32>,
    pub processed: u64,
    pub skipped: u64,
    pub canceled: bool,
    pub contender_files: Vec<PathBuf>,
    /// Best contenders across all completed lengths, canonical order.
    pub top_contenders: Vec<Contender>,
    /// Per-length warnings (filter conflicts and the like).
    pub warnings: Vec<String>,
}

/// One unit of worker output, flushed in batches on the main thread.
struct WorkItem {
    sequence: Vec<u8>,
    outcome: Outcome,
}

enum LengthReport {
    Completed {
        processed: u64,
        skipped: u64,
        file: Option<PathBuf>,
        top: Vec<Contender>,
    },
    SkippedLength {
        reason: String,
    },
    Canceled {
        processed: u64,
        skipped: u64,
    },
}

/// Run the length sweep. Fatal problems come back as a `Red` summary; a
/// cancellation as `Yellow`; anything else as `Green`.
pub fn run(
    ctx: &RunContext,
    function_name: &str,
    pool: &[u8],
    args: &MungeArgs,
) -> (MungeSummary, StatusColor) {
    match run_inner(ctx, function_name, pool, args) {
        Ok(result) => result,
        Err(e) => {
            error!(target: "seqtune.munge", error = %e, "munge aborted");
            let _ = ctx.failure_store.close();
            (
                MungeSummary {
                    message: format!("{function_name} failed: {e}"),
                    ..MungeSummary::default()
                },
                StatusColor::Red,
            )
        }
    }
}

fn run_inner(
    ctx: &RunContext,
    function_name: &str,
    pool: &[u8],
    args: &MungeArgs,
) -> Result<(MungeSummary, StatusColor)> {
    let config = &ctx.config;
    ctx.open_failure_store()?;

    let restored = if args.restore {
        load_state(
            &config.output_dir,
            config.max_sequence_len,
            &config.state_suffix,
        )?
    } else {
        None
    };
    let start_length = args
        .start_length
        .or(restored.as_ref().map(|s| s.length))
        .unwrap_or(1);

    let mut summary = MungeSummary::default();
    let mut canceled = false;
    for length in start_length..=config.max_sequence_len {
        let resume_for_length = restored.as_ref().filter(|s| s.length == length);
        match run_length(ctx, length, pool, args, resume_for_length)? {
            LengthReport::Completed {
                processed,
                skipped,
                file,
                top,
            } => {
                summary.processed += processed;
                summary.skipped += skipped;
                summary.lengths_completed.push(length);
                summary.contender_files.extend(file);
                summary.top_contenders.extend(top);
            }
            LengthReport::SkippedLength { reason } => {
                warn!(target: "seqtune.munge", length, %reason, "length skipped");
                summary.warnings.push(reason);
            }
            LengthReport::Canceled { processed, skipped } => {
                summary.processed += processed;
                summary.skipped += skipped;
                canceled = true;
                break;
            }
        }
    }
    ctx.failure_store.close()?;

    summary.top_contenders.sort_by(Contender::rank_cmp);
    summary.top_contenders.truncate(config.desired_contenders);
    summary.canceled = canceled;
    let color = if canceled {
        summary.message = format!("{function_name} canceled");
        StatusColor::Yellow
    } else {
        summary.message = format!(
            "{function_name} complete: {} sequences processed, {} pruned",
            summary.processed, summary.skipped
        );
        StatusColor::Green
    };
    Ok((summary, color))
}

/// Apply the pool filters in order: inverse pruning, cutlist, exclusion.
fn filter_pool(ctx: &RunContext, length: u32, base_pool: &[u8], args: &MungeArgs) -> Vec<u8> {
    let mut pool = base_pool.to_vec();
    pool.sort_unstable();
    pool.dedup();

    if args.remove_inverse {
        // Keep the lower member of each pair when both are present;
        // self-inverses always survive.
        let snapshot = pool.clone();
        pool.retain(|&id| {
            let Ok(inverse) = ctx.registry.inverse_of(id) else {
                return true;
            };
            inverse >= id || !snapshot.contains(&inverse)
        });
    }
    if !(ctx.config.no_cutlist || args.no_cutlist) {
        ctx.cutlist.prune(
            ctx.config.input_type,
            ctx.config.required_pass_count,
            length,
            &mut pool,
        );
    }
    pool.retain(|id| !args.exclude.contains(id));
    pool
}

fn run_length(
    ctx: &RunContext,
    length: u32,
    base_pool: &[u8],
    args: &MungeArgs,
    resume: Option<&MungeState>,
) -> Result<LengthReport> {
    let config = &ctx.config;
    let key = FailureKey::munge(
        config.mode,
        config.input_type,
        config.required_pass_count,
        length,
        config.max_gr,
    );
    let known_failures = ctx.failure_store.count(&key)?;

    // Filter arguments must name real transforms.
    for id in args
        .require_all
        .iter()
        .chain(&args.no_repeat)
        .chain(&args.exclude)
    {
        if !ctx.registry.contains(*id) {
            return Ok(LengthReport::SkippedLength {
                reason: format!("unknown transform id {id} in filter argument"),
            });
        }
    }

    let pool = filter_pool(ctx, length, base_pool, args);
    if (args.require_all.len() as u32) > length {
        return Ok(LengthReport::SkippedLength {
            reason: format!(
                "Sequence length ({length}) is too short to include all required transforms ({})",
                args.require_all.len()
            ),
        });
    }

    let plan = PermutationPlan::new(&pool, length as usize, &args.require_all, &args.no_repeat);
    let total = plan.count();
    let preferred_gr = config.preferred_global_rounds();
    let input_size_factor = config.input_size as f64 / REFERENCE_INPUT_SIZE as f64;
    let estimate = estimate_sweep(
        &ctx.registry.benchmarks_for(&pool),
        length,
        total,
        input_size_factor,
        preferred_gr,
    );
    info!(
        target: "seqtune.munge",
        length,
        pool_size = pool.len(),
        total,
        known_failures,
        estimated_s = (estimate.estimated_ms / 1000.0) as u64,
        "length sweep starting"
    );
    if total == 0 {
        return Ok(LengthReport::Completed {
            processed: 0,
            skipped: 0,
            file: None,
            top: Vec::new(),
        });
    }

    // Fresh contender table per length; a resumed sweep starts from its
    // snapshot instead.
    ctx.contender_store.clear();
    if let Some(state) = resume {
        for contender in &state.contenders {
            ctx.contender_store.offer(contender.clone());
        }
    }
    let resume_sequence = resume.map(|s| s.sequence.clone());

    let n_workers = ctx.worker_count();
    let env_pool = EnvPool::new(config.session_key);
    env_pool.prewarm(n_workers);
    let corpus = synthesize_corpus(config.input_type, config.input_size, config.corpus_seed);

    let mut counters = Counters::default();
    let mut tracker = ProgressTracker::new(
        Arc::new(Mutex::new(())),
        config.progress_report_iters,
        Duration::from_secs(config.flush_interval_secs),
        config.quiet,
    );

    let (job_tx, job_rx) = mpsc::sync_channel::<Vec<u8>>(n_workers);
    let (res_tx, res_rx) = mpsc::channel::<WorkItem>();
    let job_rx = Arc::new(Mutex::new(job_rx));

    let mut canceled = false;
    thread::scope(|scope| -> Result<()> {
        for _ in 0..n_workers {
            let job_rx = Arc::clone(&job_rx);
            let res_tx = res_tx.clone();
            let env_pool = &env_pool;
            let corpus = &corpus;
            scope.spawn(move || {
                worker_loop(&job_rx, &res_tx, env_pool, corpus, preferred_gr);
            });
        }
        drop(res_tx);

        let mut pending: Vec<WorkItem> = Vec::new();
        let mut last_checkpoint = Instant::now();
        let mut resume_found = resume_sequence.is_none();
        let mut current_sequence: Vec<u8> = Vec::new();

        for sequence in plan.iter() {
            counters.loop_counter += 1;
            if !resume_found {
                if Some(&sequence) == resume_sequence.as_ref() {
                    // The checkpointed sequence itself is re-executed.
                    resume_found = true;
                } else {
                    continue;
                }
            }
            if ctx.cancel.is_canceled() {
                canceled = true;
                break;
            }
            if ctx.failure_store.is_bad(&sequence, &key)? {
                counters.skipped += 1;
                continue;
            }
            current_sequence.clone_from(&sequence);
            // Blocks while all workers are busy; the buffer doubles as the
            // counting semaphore.
            job_tx
                .send(sequence)
                .map_err(|_| seqtune_error::TuneError::internal("worker pool hung up"))?;

            pending.extend(res_rx.try_iter());
            if pending.len() > config.flush_threshold {
                flush_queue(ctx, &key, &mut pending, &mut counters)?;
            }
            tracker.maybe_report(
                counters.loop_counter,
                counters.processed,
                counters.skipped,
                total,
                estimate.avg_per_sequence_ms,
            );
            if last_checkpoint.elapsed() >= Duration::from_secs(config.checkpoint_interval_secs) {
                write_checkpoint(ctx, length, &pool, &current_sequence)?;
                last_checkpoint = Instant::now();
            }
        }
        drop(job_tx);

        // Wait for in-flight work, then flush everything left.
        for item in res_rx.iter() {
            pending.push(item);
        }
        flush_queue(ctx, &key, &mut pending, &mut counters)?;
        if canceled {
            write_checkpoint(ctx, length, &pool, &current_sequence)?;
        }
        Ok(())
    })?;

    if canceled {
        return Ok(LengthReport::Canceled {
            processed: counters.processed,
            skipped: counters.skipped,
        });
    }

    let top = ctx.contender_store.snapshot();
    let file = if top.is_empty() {
        None
    } else {
        let file_name = contender_file_name(
            length,
            config.required_pass_count,
            config.input_type,
            config.mode,
            top[0].aggregate_score,
        );
        let mut entries = Vec::with_capacity(top.len());
        for contender in &top {
            let profile = InputProfile::probe(&contender.sequence, preferred_gr);
            let formatted =
                format_profile(&ctx.registry, &profile, SequenceFormat::All, &[])?;
            entries.push((formatted, contender.clone()));
        }
        Some(append_contender_file(
            &config.output_dir,
            &file_name,
            &entries,
        )?)
    };
    info!(
        target: "seqtune.munge",
        length,
        processed = counters.processed,
        skipped = counters.skipped,
        elapsed_s = tracker.elapsed().as_secs(),
        contenders = top.len(),
        "length sweep complete"
    );
    Ok(LengthReport::Completed {
        processed: counters.processed,
        skipped: counters.skipped,
        file,
        top,
    })
}

#[derive(Default)]
struct Counters {
    loop_counter: u64,
    processed: u64,
    skipped: u64,
}

fn worker_loop(
    job_rx: &Mutex<mpsc::Receiver<Vec<u8>>>,
    res_tx: &mpsc::Sender<WorkItem>,
    env_pool: &EnvPool,
    corpus: &[u8],
    global_rounds: u32,
) {
    loop {
        let Ok(sequence) = ({
            let rx = job_rx.lock();
            rx.recv()
        }) else {
            return;
        };
        let env = env_pool.rent();
        let profile = InputProfile::probe(&sequence, global_rounds);
        let outcome = catch_unwind(AssertUnwindSafe(|| env.evaluate(&profile, corpus)))
            .unwrap_or_else(|panic| Outcome::WorkerPanic(panic_message(&panic)));
        env_pool.give_back(env);
        if res_tx.send(WorkItem { sequence, outcome }).is_err() {
            return;
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked".to_owned())
}

/// Drain the result queue: score and offer the reversible candidates,
/// record the failures.
fn flush_queue(
    ctx: &RunContext,
    key: &FailureKey,
    pending: &mut Vec<WorkItem>,
    counters: &mut Counters,
) -> Result<()> {
    let config = &ctx.config;
    for item in pending.drain(..) {
        counters.processed += 1;
        match item.outcome {
            Outcome::Reversible { metrics } => {
                let score = aggregate_score(&metrics, config.mode);
                let passes = pass_count(&metrics);
                if !config.quiet {
                    info!(
                        target: "seqtune.munge",
                        sequence = ?item.sequence,
                        score,
                        passes,
                        "reversible"
                    );
                }
                if config.create_munge_fail_db && passes < config.required_pass_count {
                    ctx.failure_store.record_bad(&item.sequence, key)?;
                }
                ctx.contender_store.offer(Contender {
                    sequence: item.sequence,
                    aggregate_score: score,
                    metrics,
                    pass_count: passes,
                });
            }
            Outcome::NotReversible => {
                error!(
                    target: "seqtune.munge",
                    sequence = ?item.sequence,
                    "decrypt did not reproduce the input"
                );
                ctx.failure_store.record_bad(&item.sequence, key)?;
            }
            Outcome::AnalyzerError(message) => {
                error!(
                    target: "seqtune.munge",
                    sequence = ?item.sequence,
                    %message,
                    "analysis failed"
                );
                if config.create_munge_fail_db {
                    ctx.failure_store.record_bad(&item.sequence, key)?;
                }
            }
            Outcome::WorkerPanic(message) => {
                error!(
                    target: "seqtune.munge",
                    sequence = ?item.sequence,
                    %message,
                    "worker panicked; sweep continues"
                );
                if config.create_munge_fail_db {
                    ctx.failure_store.record_bad(&item.sequence, key)?;
                }
            }
        }
    }
    Ok(())
}

fn write_checkpoint(
    ctx: &RunContext,
    length: u32,
    pool: &[u8],
    current_sequence: &[u8],
) -> Result<()> {
    let mut contenders = ctx.contender_store.snapshot();
    contenders.truncate(ctx.config.desired_contenders);
    let state = MungeState {
        length,
        transforms: pool.to_vec(),
        sequence: current_sequence.to_vec(),
        contenders,
    };
    save_state(
        &ctx.config.output_dir,
        ctx.config.max_sequence_len,
        &ctx.config.state_suffix,
        &state,
    )?;
    Ok(())
}
