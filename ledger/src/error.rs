use tally_types::BlockId;
use thiserror::Error;

use crate::growable::CapacityExceeded;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("capacity exceeded: {what} is limited to {limit}")]
    CapacityExceeded { what: &'static str, limit: usize },

    #[error("unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("invalid vote hash: {0}")]
    InvalidHash(String),

    #[error("block {0} not found")]
    BlockNotFound(BlockId),

    #[error("block {0} is already aggregated")]
    AlreadyAggregated(BlockId),

    #[error("block {0} is being aggregated and accepts no votes")]
    AggregationInProgress(BlockId),

    #[error("block {block} changed during aggregation: tallied {expected} votes, found {found}")]
    BlockChanged {
        block: BlockId,
        expected: u64,
        found: u64,
    },

    #[error("aggregation of block {pending} must finish before block {requested}")]
    AggregationPending { pending: BlockId, requested: BlockId },

    #[error("block {block} links to {previous}, which was never opened")]
    PredecessorMissing { block: BlockId, previous: BlockId },

    #[error("block {block} must chain to {expected:?}, got {got}")]
    ChainMismatch {
        block: BlockId,
        expected: Option<BlockId>,
        got: BlockId,
    },

    #[error("account codec error: {0}")]
    Codec(String),

    #[error("storage error: {0}")]
    Storage(#[from] tally_store::StoreError),
}

impl LedgerError {
    pub(crate) fn capacity(what: &'static str, e: CapacityExceeded) -> Self {
        LedgerError::CapacityExceeded {
            what,
            limit: e.limit,
        }
    }
}
