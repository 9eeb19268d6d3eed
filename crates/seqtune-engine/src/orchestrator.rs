//! Smart Munge: the full pipeline across input data types.
//!
//! One Munge sweep per data type builds a per-type contender table; a
//! greedy per-metric selection distills each table into a candidate pool;
//! a BTRR pass then reorders and re-rounds that pool against the type's
//! best contender.

use std::collections::HashSet;

use seqtune_error::{Result, TuneError};
use seqtune_types::{Contender, DataType, MetricKind, StatusColor};
use tracing::{info, warn};

use crate::args::{BtrArgs, MungeArgs};
use crate::btr::BestFitResult;
use crate::{btrr, munge, RunContext};

/// Everything Smart Munge produced for one data type.
#[derive(Debug)]
pub struct TypeOutcome {
    pub input_type: DataType,
    /// The type's contender table from the Munge phase.
    pub contenders: Vec<Contender>,
    /// Candidate transform pool distilled from the table.
    pub candidate_pool: Vec<u8>,
    /// Reorder result; absent when the Munge phase found no contenders.
    pub best_fit: Option<BestFitResult>,
}

#[derive(Debug, Default)]
pub struct SmartMungeReport {
    pub outcomes: Vec<TypeOutcome>,
    pub canceled: bool,
}

pub fn smart_munge(ctx: &RunContext) -> Result<SmartMungeReport> {
    let mut report = SmartMungeReport::default();
    let pool = ctx.registry.iter_permutable();

    for input_type in DataType::SMART_MUNGE_ORDER {
        let sub = ctx.with_config(ctx.config.smart_munge_sub(input_type));
        let (summary, color) = munge::run(&sub, "smart-munge", &pool, &MungeArgs::default());
        match color {
            StatusColor::Red => {
                return Err(TuneError::internal(summary.message));
            }
            StatusColor::Yellow => {
                report.canceled = true;
                break;
            }
            StatusColor::Green => {}
        }
        info!(
            target: "seqtune.orchestrator",
            input_type = %input_type,
            contenders = summary.top_contenders.len(),
            "munge phase complete"
        );
        report.outcomes.push(TypeOutcome {
            input_type,
            contenders: summary.top_contenders,
            candidate_pool: Vec::new(),
            best_fit: None,
        });
    }
    if report.canceled {
        return Ok(report);
    }

    for outcome in &mut report.outcomes {
        let Some(reference) = outcome.contenders.first().map(|c| c.sequence.clone()) else {
            warn!(
                target: "seqtune.orchestrator",
                input_type = %outcome.input_type,
                "no contenders; reorder phase skipped"
            );
            continue;
        };
        let candidates = select_candidates(&outcome.contenders);
        let mut candidate_pool: Vec<u8> = candidates.into_iter().flatten().collect();
        candidate_pool.sort_unstable();
        candidate_pool.dedup();
        outcome.candidate_pool.clone_from(&candidate_pool);

        let sub = ctx.with_config(ctx.config.smart_munge_sub(outcome.input_type));
        let target_length = (reference.len() as u32).clamp(1, sub.config.max_btrr_len);
        let best_fit = btrr::run(
            &sub,
            &reference,
            &candidate_pool,
            target_length,
            &BtrArgs::default(),
        )?;
        outcome.best_fit = Some(best_fit);
    }
    Ok(report)
}

/// Greedy per-metric candidate selection: for each metric in evaluation
/// order, take the not-yet-used sequence with the highest score on that
/// metric. Earlier table entries win ties.
#[must_use]
pub fn select_candidates(contenders: &[Contender]) -> Vec<Vec<u8>> {
    let mut used: HashSet<&[u8]> = HashSet::new();
    let mut picks = Vec::new();
    for metric in MetricKind::ALL {
        let mut best: Option<(&Contender, f64)> = None;
        for contender in contenders {
            if used.contains(contender.sequence.as_slice()) {
                continue;
            }
            let score = contender
                .metrics
                .iter()
                .find(|r| r.metric == metric)
                .map_or(0.0, |r| r.score);
            let better = best.is_none_or(|(_, current)| score > current);
            if better {
                best = Some((contender, score));
            }
        }
        if let Some((contender, _)) = best {
            used.insert(contender.sequence.as_slice());
            picks.push(contender.sequence.clone());
        }
    }
    picks
}
