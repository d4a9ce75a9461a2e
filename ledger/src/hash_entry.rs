//! Per-hash voter set.

use serde::{Deserialize, Serialize};
use tally_types::{LedgerParams, ParticipantId, VoteHash};

use crate::{GrowableStore, LedgerError};

/// What a vote did to its entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOutcome {
    /// The participant was added to the voter set.
    Recorded,
    /// The participant had already voted for this hash; nothing changed.
    AlreadyVoted,
}

/// The voters behind one hash within a block.
///
/// The count is the voter set's length, so it always equals the number of
/// distinct voters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashVoteEntry {
    hash: VoteHash,
    voters: GrowableStore<ParticipantId>,
}

impl HashVoteEntry {
    pub fn new(hash: VoteHash, params: &LedgerParams) -> Self {
        Self {
            hash,
            voters: GrowableStore::new(
                params.initial_capacity,
                params.max_voters_per_hash,
                params.growth,
            ),
        }
    }

    pub fn hash(&self) -> VoteHash {
        self.hash
    }

    pub fn count(&self) -> u64 {
        self.voters.len() as u64
    }

    /// Voters in the order they first voted.
    pub fn voters(&self) -> &[ParticipantId] {
        self.voters.as_slice()
    }

    pub fn has_voted(&self, participant: &ParticipantId) -> bool {
        self.voters.iter().any(|v| v == participant)
    }

    /// Add `participant` unless already present.
    pub fn record_vote(&mut self, participant: ParticipantId) -> Result<VoteOutcome, LedgerError> {
        if self.has_voted(&participant) {
            return Ok(VoteOutcome::AlreadyVoted);
        }
        self.voters
            .append(participant)
            .map_err(|e| LedgerError::capacity("voters per hash", e))?;
        Ok(VoteOutcome::Recorded)
    }
}
