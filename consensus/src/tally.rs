//! Per-block tally: who agreed with the majority and who did not.

use std::collections::HashSet;

use serde::Serialize;
use tally_ledger::{BlockLedgerAccount, Verdict};
use tally_types::{BlockId, ParticipantId, QuorumRule, VoteHash};

use crate::{select_majority, ConsensusError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub block_id: BlockId,
    pub majority_hash: VoteHash,
    pub majority_count: u64,
    pub total_votes: u64,
    /// Majority voters in the order they voted.
    pub credited: Vec<ParticipantId>,
    /// Everyone else who voted in the block, first-seen order, no repeats.
    /// A participant that also backed the majority hash is credited only.
    pub debited: Vec<ParticipantId>,
}

impl Tally {
    pub fn compute(account: &BlockLedgerAccount, rule: QuorumRule) -> Result<Self, ConsensusError> {
        let block_id = account.block_id();
        let majority =
            select_majority(account.entries()).ok_or(ConsensusError::NoVotes(block_id))?;
        let total_votes = account.total_votes();

        if rule == QuorumRule::StrictMajority && majority.count() * 2 <= total_votes {
            return Err(ConsensusError::NoQuorum {
                block: block_id,
                have: majority.count(),
                total: total_votes,
            });
        }

        let credited = majority.voters().to_vec();
        let mut seen: HashSet<ParticipantId> = credited.iter().copied().collect();
        let debited = account
            .entries()
            .iter()
            .filter(|e| e.hash() != majority.hash())
            .flat_map(|e| e.voters().iter().copied())
            .filter(|p| seen.insert(*p))
            .collect();

        Ok(Self {
            block_id,
            majority_hash: majority.hash(),
            majority_count: majority.count(),
            total_votes,
            credited,
            debited,
        })
    }

    /// Verdicts in settlement order: credits first, then debits.
    pub fn settlements(&self) -> Vec<(ParticipantId, Verdict)> {
        self.credited
            .iter()
            .map(|p| (*p, Verdict::Credit))
            .chain(self.debited.iter().map(|p| (*p, Verdict::Debit)))
            .collect()
    }
}
