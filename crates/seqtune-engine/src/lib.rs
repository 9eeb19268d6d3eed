//! The search cores.
//!
//! [`munge`] sweeps every filtered permutation at lengths `1..=max`;
//! [`btr`] refines per-transform and global rounds around one sequence;
//! [`btrr`] jointly reorders and re-rounds with limited repetition; and
//! [`orchestrator`] chains data-type-specific Munges into downstream
//! reorder passes. Workers draw per-thread execution state from
//! [`env::EnvPool`] and communicate results over channels; all shared
//! stores sit behind locks owned by the run context.

pub mod args;
pub mod btr;
pub mod btrr;
pub mod cancel;
pub mod env;
pub mod evaluate;
pub mod munge;
pub mod orchestrator;
pub mod progress;

use std::sync::Arc;

use seqtune_cipher::TransformRegistry;
use seqtune_error::Result;
use seqtune_store::{ContenderStore, CutList, FailureStore};
use seqtune_types::Config;

pub use args::{parse_btr_args, parse_munge_args, BtrArgs, MungeArgs};
pub use btr::BestFitResult;
pub use cancel::CancelToken;

/// Everything a core needs for one run.
///
/// The orchestrator owns the stores for the duration of a run; cores and
/// workers reach them through this context and the locks inside each store.
#[derive(Clone)]
pub struct RunContext {
    pub config: Config,
    pub registry: Arc<TransformRegistry>,
    pub failure_store: Arc<FailureStore>,
    pub contender_store: Arc<ContenderStore>,
    pub cutlist: Arc<CutList>,
    pub cancel: CancelToken,
}

impl RunContext {
    pub fn new(config: Config, registry: TransformRegistry) -> Result<Self> {
        let contender_store = Arc::new(ContenderStore::new(config.desired_contenders));
        Ok(Self {
            config,
            registry: Arc::new(registry),
            failure_store: Arc::new(FailureStore::new()),
            contender_store,
            cutlist: Arc::new(CutList::builtin()),
            cancel: CancelToken::new(),
        })
    }

    /// Sub-context for one Smart Munge data type: same stores and registry,
    /// adjusted configuration.
    #[must_use]
    pub fn with_config(&self, config: Config) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    /// Bounded worker count: the configured override or one per core.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.config.worker_count.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, std::num::NonZero::get)
        })
    }

    /// Open the failure store for a core's run: the configured path, or an
    /// index-only store when no path is set.
    pub fn open_failure_store(&self) -> Result<()> {
        match &self.config.fail_db_path {
            Some(path) => {
                let create = self.config.create_munge_fail_db || self.config.create_btr_fail_db;
                self.failure_store.open(path, create)
            }
            None => self.failure_store.open_in_memory(),
        }
    }
}
