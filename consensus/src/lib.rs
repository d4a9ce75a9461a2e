//! Consensus: majority aggregation over block ledger accounts.
//!
//! A block's votes are tallied once: the hash with the most distinct voters
//! wins, its voters are credited, and everyone else who voted in the block is
//! debited. The block is then marked aggregated and accepts no more votes.
//!
//! ## Module overview
//!
//! - [`majority`] — first-seen maximum selection.
//! - [`tally`] — credited/debited sets for one block.
//! - [`aggregator`] — settlement ordering and the block state flip.
//! - [`error`] — Consensus error types.

pub mod aggregator;
pub mod error;
pub mod majority;
pub mod tally;

pub use aggregator::{AggregationOutcome, Aggregator};
pub use error::ConsensusError;
pub use majority::select_majority;
pub use tally::Tally;
