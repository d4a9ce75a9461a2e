//! Per-participant credit/debit account.

use serde::{Deserialize, Serialize};
use tally_types::{BlockId, ParticipantId};

/// How one aggregation judged a participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Voted with the majority.
    Credit,
    /// Voted only for losing hashes.
    Debit,
}

/// Running tally for one participant. Counters only ever grow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantAccount {
    participant: ParticipantId,
    credit: u64,
    debit: u64,
    last_aggregated_block: Option<BlockId>,
}

impl ParticipantAccount {
    pub fn new(participant: ParticipantId) -> Self {
        Self {
            participant,
            credit: 0,
            debit: 0,
            last_aggregated_block: None,
        }
    }

    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    pub fn credit(&self) -> u64 {
        self.credit
    }

    pub fn debit(&self) -> u64 {
        self.debit
    }

    pub fn last_aggregated_block(&self) -> Option<BlockId> {
        self.last_aggregated_block
    }

    /// `(credit, debit, last_aggregated_block)`.
    pub fn get(&self) -> (u64, u64, Option<BlockId>) {
        (self.credit, self.debit, self.last_aggregated_block)
    }

    /// Apply `verdict` for `block`, at most once per block.
    ///
    /// Returns `false` when this block was already the last one applied, which
    /// makes a retried aggregation safe.
    pub fn settle(&mut self, verdict: Verdict, block: BlockId) -> bool {
        if self.last_aggregated_block == Some(block) {
            return false;
        }
        match verdict {
            Verdict::Credit => self.credit = self.credit.saturating_add(1),
            Verdict::Debit => self.debit = self.debit.saturating_add(1),
        }
        self.last_aggregated_block = Some(block);
        true
    }
}
