use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] tally_ledger::LedgerError),

    #[error("consensus error: {0}")]
    Consensus(#[from] tally_consensus::ConsensusError),

    #[error("lmdb error: {0}")]
    Lmdb(#[from] tally_store_lmdb::LmdbError),

    #[error("invalid participant: {0}")]
    InvalidParticipant(#[from] tally_types::TypesError),

    #[error("config error: {0}")]
    Config(String),
}
