//! Permutation engine: the enumeration substrate under every search core.
//!
//! Three enumerators, all lazy:
//! - [`PermutationPlan`]: fixed-length sequences over a pool, filtered by a
//!   required set, per-id repetition caps, and a no-repeat set, emitted in
//!   lexicographic order, with an exact count available without
//!   materialization.
//! - [`RoundConfigIter`]: every per-transform rounds assignment in
//!   `[1..=max_tr]^len`.
//! - [`JointIter`]: the cartesian pairing of limited-repetition sequences
//!   with round configs, used by the reorder optimizer.

mod estimate;
mod generate;
mod rounds;

pub use estimate::{estimate_sweep, SweepEstimate, EVALUATION_PASSES};
pub use generate::{PermutationPlan, SequenceIter};
pub use rounds::{JointIter, RoundConfigIter};
