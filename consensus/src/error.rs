use tally_ledger::LedgerError;
use tally_types::BlockId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("block {0} not found")]
    BlockNotFound(BlockId),

    #[error("block {0} is already aggregated")]
    AlreadyAggregated(BlockId),

    #[error("block {0} has no votes")]
    NoVotes(BlockId),

    #[error("no quorum for block {block}: {have} of {total} votes")]
    NoQuorum { block: BlockId, have: u64, total: u64 },

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
