//! Command-line driver for the search cores.
//!
//! ```text
//! seqtune munge [-L<N>] [-restore] [--require-all ids] [--no-repeat ids]
//!               [--exclude ids] [--no-cutlist] [--remove-inverse]
//! seqtune btr <sequence> [--max-rounds N] [--starting-round N]
//! seqtune btrr <sequence> [--max-rounds N] [--starting-round N]
//! seqtune smart
//! ```
//!
//! Exit codes: 0 on clean completion, 1 on fatal error, 2 on user abort.

use std::process::ExitCode;

use seqtune_cipher::TransformRegistry;
use seqtune_codec::{parse_sequence, ParseOptions};
use seqtune_engine::{
    btr, btrr, munge, orchestrator, parse_btr_args, parse_munge_args, RunContext,
};
use seqtune_error::{Result, TuneError};
use seqtune_types::{Config, StatusColor};

fn main() -> ExitCode {
    tracing_subscriber::fmt().init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        eprintln!("usage: seqtune <munge|btr|btrr|smart> [flags]");
        return ExitCode::from(1);
    };
    match dispatch(command, rest) {
        Ok(color) => ExitCode::from(color.exit_code() as u8),
        Err(e) => {
            eprintln!("seqtune: {e}");
            ExitCode::from(1)
        }
    }
}

fn dispatch(command: &str, rest: &[String]) -> Result<StatusColor> {
    let ctx = RunContext::new(Config::default(), TransformRegistry::reference())?;
    match command {
        "munge" => {
            let args = parse_munge_args(rest)?;
            let pool = ctx.registry.iter_permutable();
            let (summary, color) = munge::run(&ctx, "munge", &pool, &args);
            println!("{}", summary.message);
            for warning in &summary.warnings {
                println!("warning: {warning}");
            }
            for file in &summary.contender_files {
                println!("contenders: {}", file.display());
            }
            Ok(color)
        }
        "btr" | "btrr" => {
            let Some((sequence_arg, flags)) = rest.split_first() else {
                return Err(TuneError::parse(format!("{command} needs a sequence")));
            };
            let parsed = parse_sequence(&ctx.registry, sequence_arg, ParseOptions::default())?;
            let ids = parsed.sequence.ids();
            let args = parse_btr_args(flags)?;
            let result = if command == "btr" {
                btr::run(&ctx, &ids, &args)?
            } else {
                let target = (ids.len() as u32).clamp(1, ctx.config.max_btrr_len);
                btrr::run(&ctx, &ids, &ids, target, &args)?
            };
            println!("baseline: {}  ({:.4})", result.baseline_sequence, result.baseline_score);
            println!("best:     {}  ({:.4})", result.best_sequence, result.best_score);
            println!(
                "{}",
                if result.improved {
                    "improved over baseline"
                } else {
                    "no improvement over baseline"
                }
            );
            Ok(StatusColor::Green)
        }
        "smart" => {
            let report = orchestrator::smart_munge(&ctx)?;
            for outcome in &report.outcomes {
                let best = outcome
                    .best_fit
                    .as_ref()
                    .map_or_else(|| "(no contenders)".to_owned(), |b| b.best_sequence.clone());
                println!("{}: {best}", outcome.input_type);
            }
            Ok(if report.canceled {
                StatusColor::Yellow
            } else {
                StatusColor::Green
            })
        }
        other => Err(TuneError::parse(format!("unknown command: {other}"))),
    }
}
