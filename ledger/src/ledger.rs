//! Ledger operations over a storage substrate.
//!
//! Each public operation touches accounts only through
//! [`AccountStore::update`], so every single-account change is one atomic
//! read-modify-write. Operations that span accounts (participant settlement
//! followed by the block flip) are ordered by the aggregator, not here. The
//! ledger supplies the pieces that make that ordering safe: sealing a block at
//! a vote total, and a single in-flight aggregation marker.

use tally_store::{AccountKey, AccountStore, Mutation};
use tally_types::{BlockId, LedgerParams, ParticipantId, VoteHash};
use tracing::{debug, info, warn};

use crate::codec;
use crate::{
    BlockLedgerAccount, BlockState, BlockView, LedgerError, ParticipantAccount, ParticipantValidator,
    StructuralValidator, Verdict, VoteOutcome, VoteReceipt, VoterAccountingRow,
    VoterAccountingTable,
};

/// Whether [`Ledger::ensure_open`] created the block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenStatus {
    Created,
    Existing,
}

pub struct Ledger<S> {
    store: S,
    params: LedgerParams,
    validator: Box<dyn ParticipantValidator>,
}

impl<S: AccountStore> Ledger<S> {
    pub fn new(store: S, params: LedgerParams) -> Self {
        Self {
            store,
            params,
            validator: Box::new(StructuralValidator),
        }
    }

    /// Replace the default structural identity check.
    pub fn with_validator(mut self, validator: impl ParticipantValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Blocks ──────────────────────────────────────────────────────────

    /// Create the block account `Open` if it does not exist yet.
    ///
    /// Repeat calls are no-ops and never re-initialise the account. A supplied
    /// chain link must name the block one window back, and that block must
    /// already be open.
    pub fn ensure_open(
        &self,
        block_id: BlockId,
        previous: Option<BlockId>,
    ) -> Result<OpenStatus, LedgerError> {
        if let Some(got) = previous {
            let expected = block_id.predecessor(self.params.window_size);
            if expected != Some(got) {
                return Err(LedgerError::ChainMismatch {
                    block: block_id,
                    expected,
                    got,
                });
            }
            if !self.store.exists(&AccountKey::block_ledger(got))? {
                return Err(LedgerError::PredecessorMissing {
                    block: block_id,
                    previous: got,
                });
            }
        }

        let key = AccountKey::block_ledger(block_id);
        let status = self.store.update(&key, |current| -> Result<_, LedgerError> {
            if current.is_some() {
                return Ok(Mutation::keep(OpenStatus::Existing));
            }
            let account = BlockLedgerAccount::new(block_id, previous, &self.params);
            let data = codec::encode(&account, self.params.max_account_bytes)?;
            Ok(Mutation::write(data, OpenStatus::Created))
        })?;

        if status == OpenStatus::Created {
            info!(block_id = %block_id, previous = ?previous, "opened block ledger account");
        }
        Ok(status)
    }

    /// Record a vote submitted at the boundary.
    ///
    /// `participant` goes through the configured validator and `hash` is
    /// fitted to the fixed digest width. The block is opened on first use.
    pub fn append_vote(
        &self,
        block_id: BlockId,
        hash: &[u8],
        participant: &str,
    ) -> Result<VoteReceipt, LedgerError> {
        let participant = self.validator.validate(participant)?;
        let hash = VoteHash::from_slice(hash).map_err(|e| LedgerError::InvalidHash(e.to_string()))?;
        self.record_vote(block_id, hash, participant)
    }

    /// Record a vote with already-typed inputs.
    ///
    /// Opening the block and recording the vote happen in one read-modify-write,
    /// so there is no window between the existence check and the append.
    pub fn record_vote(
        &self,
        block_id: BlockId,
        hash: VoteHash,
        participant: ParticipantId,
    ) -> Result<VoteReceipt, LedgerError> {
        if !participant.is_valid() {
            return Err(LedgerError::UnknownParticipant(participant.to_string()));
        }
        let link = self.existing_predecessor(block_id)?;
        let key = AccountKey::block_ledger(block_id);
        let receipt = self.store.update(&key, |current| -> Result<_, LedgerError> {
            let mut account = match current {
                Some(data) => codec::decode::<BlockLedgerAccount>(data)?,
                None => BlockLedgerAccount::new(block_id, link, &self.params),
            };
            let receipt = account.record_vote(hash, participant, &self.params)?;
            if current.is_some() && receipt.outcome == VoteOutcome::AlreadyVoted {
                return Ok(Mutation::keep(receipt));
            }
            let data = codec::encode(&account, self.params.max_account_bytes)?;
            Ok(Mutation::write(data, receipt))
        })?;
        self.ensure_participant(&participant)?;

        debug!(
            block_id = %block_id,
            hash = %hash,
            participant = %participant,
            count = receipt.count,
            outcome = ?receipt.outcome,
            "vote appended"
        );
        Ok(receipt)
    }

    /// The predecessor link for a lazily opened block: set only when that
    /// predecessor account exists.
    fn existing_predecessor(&self, block_id: BlockId) -> Result<Option<BlockId>, LedgerError> {
        match block_id.predecessor(self.params.window_size) {
            Some(prev) if self.store.exists(&AccountKey::block_ledger(prev))? => Ok(Some(prev)),
            _ => Ok(None),
        }
    }

    pub fn load_block(&self, block_id: BlockId) -> Result<Option<BlockLedgerAccount>, LedgerError> {
        self.store
            .load(&AccountKey::block_ledger(block_id))?
            .map(|data| codec::decode(&data))
            .transpose()
    }

    pub fn read_block(&self, block_id: BlockId) -> Result<BlockView, LedgerError> {
        let account = self
            .load_block(block_id)?
            .ok_or(LedgerError::BlockNotFound(block_id))?;
        Ok(BlockView::from(&account))
    }

    /// Freeze a block at `expected_votes` before its verdicts are settled.
    ///
    /// Fails with [`LedgerError::BlockChanged`] if a vote landed after the
    /// tally was computed. Sealing again at the same total writes nothing.
    pub fn seal(&self, block_id: BlockId, expected_votes: u64) -> Result<(), LedgerError> {
        let key = AccountKey::block_ledger(block_id);
        let sealed = self.store.update(&key, |current| -> Result<_, LedgerError> {
            let data = current.ok_or(LedgerError::BlockNotFound(block_id))?;
            let mut account = codec::decode::<BlockLedgerAccount>(data)?;
            if !account.seal(expected_votes)? {
                return Ok(Mutation::keep(false));
            }
            let data = codec::encode(&account, self.params.max_account_bytes)?;
            Ok(Mutation::write(data, true))
        })?;
        if sealed {
            debug!(block_id = %block_id, total_votes = expected_votes, "block sealed");
        }
        Ok(())
    }

    /// Mark a block aggregated, provided it still holds `expected_votes`.
    ///
    /// Fails if it is missing, already aggregated, or changed since its tally.
    pub fn close(&self, block_id: BlockId, expected_votes: u64) -> Result<(), LedgerError> {
        let key = AccountKey::block_ledger(block_id);
        self.store.update(&key, |current| -> Result<_, LedgerError> {
            let data = current.ok_or(LedgerError::BlockNotFound(block_id))?;
            let mut account = codec::decode::<BlockLedgerAccount>(data)?;
            account.close(expected_votes)?;
            let data = codec::encode(&account, self.params.max_account_bytes)?;
            Ok(Mutation::write(data, ()))
        })?;
        info!(block_id = %block_id, "block marked aggregated");
        Ok(())
    }

    // ── Participants ────────────────────────────────────────────────────

    fn ensure_participant(&self, participant: &ParticipantId) -> Result<(), LedgerError> {
        let key = AccountKey::participant(participant);
        self.store.update(&key, |current| -> Result<_, LedgerError> {
            if current.is_some() {
                return Ok(Mutation::keep(()));
            }
            let account = ParticipantAccount::new(*participant);
            let data = codec::encode(&account, self.params.max_account_bytes)?;
            Ok(Mutation::write(data, ()))
        })
    }

    pub fn participant_exists(&self, participant: &ParticipantId) -> Result<bool, LedgerError> {
        Ok(self.store.exists(&AccountKey::participant(participant))?)
    }

    /// A participant's account. Never-seen participants read as all zeros.
    pub fn read_participant(
        &self,
        participant: &ParticipantId,
    ) -> Result<ParticipantAccount, LedgerError> {
        match self.store.load(&AccountKey::participant(participant))? {
            Some(data) => codec::decode(&data),
            None => Ok(ParticipantAccount::new(*participant)),
        }
    }

    /// Apply one verdict to a participant account, creating it if absent.
    ///
    /// Returns `false` when the verdict for `block` was already applied.
    pub fn settle_participant(
        &self,
        participant: &ParticipantId,
        verdict: Verdict,
        block: BlockId,
    ) -> Result<bool, LedgerError> {
        let key = AccountKey::participant(participant);
        self.store.update(&key, |current| -> Result<_, LedgerError> {
            let mut account = match current {
                Some(data) => codec::decode::<ParticipantAccount>(data)?,
                None => ParticipantAccount::new(*participant),
            };
            if !account.settle(verdict, block) {
                return Ok(Mutation::keep(false));
            }
            let data = codec::encode(&account, self.params.max_account_bytes)?;
            Ok(Mutation::write(data, true))
        })
    }

    // ── Voter accounting table ──────────────────────────────────────────

    fn load_accounting(&self) -> Result<VoterAccountingTable, LedgerError> {
        match self.store.load(&AccountKey::accounting())? {
            Some(data) => codec::decode(&data),
            None => Ok(VoterAccountingTable::new(&self.params)),
        }
    }

    pub fn pending_aggregation(&self) -> Result<Option<BlockId>, LedgerError> {
        Ok(self.load_accounting()?.pending())
    }

    /// Record `block_id` as the aggregation in flight.
    ///
    /// Another block holding the marker must finish first. A marker left by a
    /// block that did reach `Aggregated` is stale and is taken over.
    pub fn begin_aggregation(&self, block_id: BlockId) -> Result<(), LedgerError> {
        let held = self.load_accounting()?.pending();
        if let Some(pending) = held.filter(|p| *p != block_id) {
            let closed = matches!(
                self.load_block(pending)?,
                Some(account) if account.state() == BlockState::Aggregated
            );
            if !closed {
                return Err(LedgerError::AggregationPending {
                    pending,
                    requested: block_id,
                });
            }
            warn!(pending = %pending, requested = %block_id, "taking over stale aggregation marker");
        }

        let key = AccountKey::accounting();
        self.store.update(&key, |current| -> Result<_, LedgerError> {
            let mut table = match current {
                Some(data) => codec::decode::<VoterAccountingTable>(data)?,
                None => VoterAccountingTable::new(&self.params),
            };
            match table.pending() {
                Some(pending) if pending == block_id => return Ok(Mutation::keep(())),
                Some(pending) if Some(pending) != held => {
                    return Err(LedgerError::AggregationPending {
                        pending,
                        requested: block_id,
                    })
                }
                _ => {}
            }
            table.begin(block_id);
            let data = codec::encode(&table, self.params.max_account_bytes)?;
            Ok(Mutation::write(data, ()))
        })
    }

    /// Clear the in-flight marker if it still names `block_id`.
    pub fn finish_aggregation(&self, block_id: BlockId) -> Result<(), LedgerError> {
        let key = AccountKey::accounting();
        self.store.update(&key, |current| -> Result<_, LedgerError> {
            let Some(data) = current else {
                return Ok(Mutation::keep(()));
            };
            let mut table = codec::decode::<VoterAccountingTable>(data)?;
            if !table.finish(block_id) {
                return Ok(Mutation::keep(()));
            }
            let data = codec::encode(&table, self.params.max_account_bytes)?;
            Ok(Mutation::write(data, ()))
        })
    }

    pub fn accounting_len(&self) -> Result<u64, LedgerError> {
        Ok(self.load_accounting()?.len() as u64)
    }

    /// Rows `offset..offset + limit` of the accounting table.
    pub fn read_accounting_chunk(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<VoterAccountingRow>, LedgerError> {
        let table = self.load_accounting()?;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(table.chunk(offset, limit).to_vec())
    }

    /// Dry-run `settlements` against the table without writing anything.
    ///
    /// Surfaces row and size ceilings before any account is touched.
    pub fn check_accounting(
        &self,
        settlements: &[(ParticipantId, Verdict)],
        block: BlockId,
    ) -> Result<(), LedgerError> {
        let mut table = self.load_accounting()?;
        for (participant, verdict) in settlements {
            table.settle(*participant, *verdict, block)?;
        }
        codec::encode(&table, self.params.max_account_bytes)?;
        Ok(())
    }

    /// Mirror `settlements` into the accounting table in one write.
    ///
    /// Returns how many rows changed.
    pub fn settle_accounting(
        &self,
        settlements: &[(ParticipantId, Verdict)],
        block: BlockId,
    ) -> Result<usize, LedgerError> {
        let key = AccountKey::accounting();
        self.store.update(&key, |current| -> Result<_, LedgerError> {
            let mut table = match current {
                Some(data) => codec::decode::<VoterAccountingTable>(data)?,
                None => VoterAccountingTable::new(&self.params),
            };
            let mut changed = 0;
            for (participant, verdict) in settlements {
                if table.settle(*participant, *verdict, block)? {
                    changed += 1;
                }
            }
            if changed == 0 {
                return Ok(Mutation::keep(0));
            }
            let data = codec::encode(&table, self.params.max_account_bytes)?;
            Ok(Mutation::write(data, changed))
        })
    }
}
