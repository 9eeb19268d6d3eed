//! Cutlist: ids known never to reach the contender table in a context.
//!
//! Keyed by `(data type, required pass count, sequence length)`. Entries are
//! precomputed from prior sweeps; pruning them from the pool skips work that
//! cannot pay off. `--no-cutlist` bypasses the table entirely.

use std::collections::{HashMap, HashSet};

use seqtune_types::DataType;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct CutList {
    map: HashMap<(DataType, u32, u32), HashSet<u8>>,
}

impl CutList {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The table shipped with the reference transforms.
    ///
    /// Pure permutation transforms cannot change a byte histogram, so at
    /// length 1 they never whiten structured input enough to contend.
    #[must_use]
    pub fn builtin() -> Self {
        let permutation_only: HashSet<u8> = [12, 15, 16, 17, 18, 19, 24, 25].into();
        let mut map = HashMap::new();
        for data_type in [DataType::Sequence, DataType::Natural, DataType::Combined] {
            map.insert((data_type, 6, 1), permutation_only.clone());
        }
        Self { map }
    }

    /// Replace the entry for one context. Test hook and profiler import.
    pub fn set(&mut self, data_type: DataType, pass_count: u32, length: u32, ids: HashSet<u8>) {
        self.map.insert((data_type, pass_count, length), ids);
    }

    /// Ids cut for the context, if any.
    #[must_use]
    pub fn cut_for(&self, data_type: DataType, pass_count: u32, length: u32) -> Option<&HashSet<u8>> {
        self.map.get(&(data_type, pass_count, length))
    }

    /// Remove cut ids from the pool in place; returns how many were cut.
    pub fn prune(
        &self,
        data_type: DataType,
        pass_count: u32,
        length: u32,
        pool: &mut Vec<u8>,
    ) -> usize {
        let Some(cut) = self.cut_for(data_type, pass_count, length) else {
            return 0;
        };
        let before = pool.len();
        pool.retain(|id| !cut.contains(id));
        let removed = before - pool.len();
        if removed > 0 {
            debug!(
                target: "seqtune.cutlist",
                data_type = %data_type,
                length,
                removed,
                "cutlist pruned pool"
            );
        }
        removed
    }
}
