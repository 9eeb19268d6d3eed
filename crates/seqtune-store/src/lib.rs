//! Persistence for the search cores.
//!
//! Four pieces: the failure database that prunes known-bad sequences across
//! runs, the bounded top-N contender store, atomic checkpoint snapshots for
//! resume, and the cutlist of ids known never to contend in a given
//! context.

pub mod checkpoint;
pub mod contender;
pub mod cutlist;
pub mod failure;

pub use checkpoint::{load_state, save_state, state_file_name, MungeState};
pub use contender::ContenderStore;
pub use cutlist::CutList;
pub use failure::FailureStore;
