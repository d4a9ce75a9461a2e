//! Block ledger account: the per-block vote container and its state machine.
//!
//! ```text
//!   ensure_open / first vote          close (by the aggregator)
//!  ─────────────────────────▶ Open ─────────────────────────▶ Aggregated
//! ```
//!
//! `Aggregated` is terminal. Votes arriving afterwards are rejected with
//! [`LedgerError::AlreadyAggregated`] so that the recorded tally always matches
//! the one that was settled.
//!
//! An `Open` block is sealed at a vote total when aggregation starts. From then
//! on votes are refused with [`LedgerError::AggregationInProgress`], and the
//! flip to `Aggregated` only succeeds against the same total.

use serde::{Deserialize, Serialize};
use tally_types::{BlockId, LedgerParams, ParticipantId, VoteHash};

use crate::{GrowableStore, HashVoteEntry, LedgerError, VoteOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockState {
    /// Accepting votes.
    Open,
    /// Settled by the aggregator. Terminal state.
    Aggregated,
}

/// Returned by every vote append.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub block_id: BlockId,
    pub hash: VoteHash,
    pub count: u64,
    pub voter_set_size: u64,
    pub outcome: VoteOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLedgerAccount {
    block_id: BlockId,
    /// The chained predecessor, one window back.
    previous: Option<BlockId>,
    state: BlockState,
    /// Hash entries in first-seen order.
    entries: GrowableStore<HashVoteEntry>,
    /// Vote total the block was frozen at when aggregation began.
    sealed_at: Option<u64>,
}

impl BlockLedgerAccount {
    pub fn new(block_id: BlockId, previous: Option<BlockId>, params: &LedgerParams) -> Self {
        Self {
            block_id,
            previous,
            state: BlockState::Open,
            entries: GrowableStore::new(
                params.initial_capacity,
                params.max_hash_entries,
                params.growth,
            ),
            sealed_at: None,
        }
    }

    pub fn block_id(&self) -> BlockId {
        self.block_id
    }

    pub fn previous(&self) -> Option<BlockId> {
        self.previous
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    /// Whether an aggregation has frozen this block.
    pub fn is_sealed(&self) -> bool {
        self.sealed_at.is_some()
    }

    pub fn entries(&self) -> &[HashVoteEntry] {
        self.entries.as_slice()
    }

    pub fn entry(&self, hash: &VoteHash) -> Option<&HashVoteEntry> {
        self.entries.iter().find(|e| e.hash() == *hash)
    }

    /// Sum of all entry counts. A participant voting for two hashes counts twice.
    pub fn total_votes(&self) -> u64 {
        self.entries.iter().map(HashVoteEntry::count).sum()
    }

    /// Record `participant`'s vote for `hash`.
    ///
    /// On error the account is left exactly as it was.
    pub fn record_vote(
        &mut self,
        hash: VoteHash,
        participant: ParticipantId,
        params: &LedgerParams,
    ) -> Result<VoteReceipt, LedgerError> {
        if self.state == BlockState::Aggregated {
            return Err(LedgerError::AlreadyAggregated(self.block_id));
        }
        if self.is_sealed() {
            return Err(LedgerError::AggregationInProgress(self.block_id));
        }

        let (outcome, count) = match self.entries.position(|e| e.hash() == hash) {
            Some(index) => {
                let entry = self
                    .entries
                    .get_mut(index)
                    .ok_or_else(|| LedgerError::Codec("entry index out of range".into()))?;
                let outcome = entry.record_vote(participant)?;
                (outcome, entry.count())
            }
            None => {
                let mut entry = HashVoteEntry::new(hash, params);
                let outcome = entry.record_vote(participant)?;
                let count = entry.count();
                self.entries
                    .append(entry)
                    .map_err(|e| LedgerError::capacity("hash entries per block", e))?;
                (outcome, count)
            }
        };

        Ok(VoteReceipt {
            block_id: self.block_id,
            hash,
            count,
            voter_set_size: count,
            outcome,
        })
    }

    /// Freeze the block at `expected_votes` so no vote can land mid-settlement.
    ///
    /// Returns `false` when it was already sealed at that total, as on a
    /// retried aggregation.
    pub fn seal(&mut self, expected_votes: u64) -> Result<bool, LedgerError> {
        self.check_unchanged(expected_votes)?;
        if self.sealed_at == Some(expected_votes) {
            return Ok(false);
        }
        self.sealed_at = Some(expected_votes);
        Ok(true)
    }

    /// Mark the block aggregated. Irreversible.
    ///
    /// `expected_votes` is the total the settled tally was computed from.
    pub fn close(&mut self, expected_votes: u64) -> Result<(), LedgerError> {
        self.check_unchanged(expected_votes)?;
        self.state = BlockState::Aggregated;
        Ok(())
    }

    fn check_unchanged(&self, expected_votes: u64) -> Result<(), LedgerError> {
        if self.state == BlockState::Aggregated {
            return Err(LedgerError::AlreadyAggregated(self.block_id));
        }
        let found = self.total_votes();
        if found != expected_votes {
            return Err(LedgerError::BlockChanged {
                block: self.block_id,
                expected: expected_votes,
                found,
            });
        }
        Ok(())
    }
}
