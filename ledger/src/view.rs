//! Read-only views handed to callers.

use serde::Serialize;
use tally_types::{BlockId, ParticipantId, VoteHash};

use crate::{BlockLedgerAccount, BlockState};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntryView {
    pub hash: VoteHash,
    pub count: u64,
    pub voters: Vec<ParticipantId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlockView {
    pub block_id: BlockId,
    /// Entries in first-seen order.
    pub entries: Vec<EntryView>,
    pub previous: Option<BlockId>,
    pub state: BlockState,
    /// Whether an aggregation has frozen the block's votes.
    pub sealed: bool,
}

impl From<&BlockLedgerAccount> for BlockView {
    fn from(account: &BlockLedgerAccount) -> Self {
        Self {
            block_id: account.block_id(),
            entries: account
                .entries()
                .iter()
                .map(|e| EntryView {
                    hash: e.hash(),
                    count: e.count(),
                    voters: e.voters().to_vec(),
                })
                .collect(),
            previous: account.previous(),
            state: account.state(),
            sealed: account.is_sealed(),
        }
    }
}
