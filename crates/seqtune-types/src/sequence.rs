//! Sequences and their round annotations.
//!
//! Two sequences are equal iff their transform-id lists match element-wise.
//! The per-step `tr` values and the global-rounds value carried alongside
//! are an *annotation* that parameterizes execution, never identity; the
//! manual `PartialEq`/`Hash` impls below encode exactly that.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// One step of a sequence: a transform id plus its repetition count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStep {
    pub id: u8,
    /// Transform rounds, `1..=max_tr`.
    pub tr: u8,
}

impl SequenceStep {
    #[must_use]
    pub fn new(id: u8, tr: u8) -> Self {
        Self { id, tr }
    }
}

/// An ordered list of transform steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sequence {
    steps: Vec<SequenceStep>,
}

impl Sequence {
    #[must_use]
    pub fn new(steps: Vec<SequenceStep>) -> Self {
        Self { steps }
    }

    /// Build a sequence from bare ids with every `tr` set to 1.
    #[must_use]
    pub fn from_ids(ids: &[u8]) -> Self {
        Self {
            steps: ids.iter().map(|&id| SequenceStep::new(id, 1)).collect(),
        }
    }

    /// Pair up ids with an explicit round configuration.
    ///
    /// `rounds` shorter than `ids` is padded with 1.
    #[must_use]
    pub fn from_ids_and_rounds(ids: &[u8], rounds: &[u8]) -> Self {
        Self {
            steps: ids
                .iter()
                .enumerate()
                .map(|(i, &id)| SequenceStep::new(id, rounds.get(i).copied().unwrap_or(1)))
                .collect(),
        }
    }

    #[must_use]
    pub fn steps(&self) -> &[SequenceStep] {
        &self.steps
    }

    /// The identity of the sequence: its id list, annotation stripped.
    #[must_use]
    pub fn ids(&self) -> Vec<u8> {
        self.steps.iter().map(|s| s.id).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.steps.len() == other.steps.len()
            && self
                .steps
                .iter()
                .zip(&other.steps)
                .all(|(a, b)| a.id == b.id)
    }
}

impl Eq for Sequence {}

impl Hash for Sequence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for step in &self.steps {
            step.id.hash(state);
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for step in &self.steps {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            write!(f, "{}", step.id)?;
        }
        Ok(())
    }
}
