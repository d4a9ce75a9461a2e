//! Block aggregation.
//!
//! Settlement touches several accounts, and the substrate only makes each
//! single-account update atomic. The order below keeps an interrupted run
//! safe to retry:
//!
//! 1. dry-run the accounting table so row and size ceilings fail before any write
//! 2. claim the in-flight aggregation marker, refused while another block holds it
//! 3. seal the block at the tallied vote total, refused if a vote landed since
//! 4. settle participant accounts, each guarded by its last aggregated block
//! 5. mirror the same verdicts into the accounting table
//! 6. flip the block to `Aggregated` against the sealed total
//! 7. release the marker
//!
//! Until step 6 commits the block is still `Open` but sealed, so it takes no
//! votes and a retry recomputes the same tally. Every already-settled account
//! skips itself. The marker keeps a second block from settling in between,
//! since a participant's guard only remembers the most recent block.

use serde::Serialize;
use tally_ledger::{BlockState, Ledger, LedgerError};
use tally_store::AccountStore;
use tally_types::{BlockId, ParticipantId, QuorumRule, VoteHash};
use tracing::{debug, info, warn};

use crate::{ConsensusError, Tally};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AggregationOutcome {
    pub block_id: BlockId,
    pub majority_hash: VoteHash,
    pub majority_count: u64,
    pub credited_participants: Vec<ParticipantId>,
    pub debited_participants: Vec<ParticipantId>,
    /// The block one window back and its state, `None` state if it was never opened.
    pub predecessor: Option<(BlockId, Option<BlockState>)>,
}

pub struct Aggregator<'a, S> {
    ledger: &'a Ledger<S>,
    rule: QuorumRule,
}

impl<'a, S: AccountStore> Aggregator<'a, S> {
    pub fn new(ledger: &'a Ledger<S>) -> Self {
        Self {
            ledger,
            rule: QuorumRule::default(),
        }
    }

    pub fn with_rule(mut self, rule: QuorumRule) -> Self {
        self.rule = rule;
        self
    }

    /// Tally `block_id`, settle every voter, and close the block.
    ///
    /// On `NoVotes` or `NoQuorum` nothing is written and the block stays open.
    /// A vote arriving between the tally and the seal fails the run with
    /// [`LedgerError::BlockChanged`]; the block stays open and the call can be
    /// retried.
    pub fn aggregate(&self, block_id: BlockId) -> Result<AggregationOutcome, ConsensusError> {
        let account = self
            .ledger
            .load_block(block_id)?
            .ok_or(ConsensusError::BlockNotFound(block_id))?;
        if account.state() == BlockState::Aggregated {
            return Err(ConsensusError::AlreadyAggregated(block_id));
        }

        let tally = Tally::compute(&account, self.rule)?;
        let predecessor = self.predecessor(account.previous(), block_id)?;

        let settlements = tally.settlements();
        self.ledger.check_accounting(&settlements, block_id)?;

        self.ledger.begin_aggregation(block_id)?;
        if let Err(e) = self.ledger.seal(block_id, tally.total_votes) {
            if matches!(e, LedgerError::BlockChanged { .. }) {
                debug!(block_id = %block_id, "block changed before seal, releasing marker");
                self.ledger.finish_aggregation(block_id)?;
            }
            return Err(e.into());
        }

        let mut settled = 0usize;
        for (participant, verdict) in &settlements {
            if self.ledger.settle_participant(participant, *verdict, block_id)? {
                settled += 1;
            }
        }
        let rows = self.ledger.settle_accounting(&settlements, block_id)?;

        self.ledger
            .close(block_id, tally.total_votes)
            .map_err(|e| match e {
                LedgerError::AlreadyAggregated(b) => ConsensusError::AlreadyAggregated(b),
                other => ConsensusError::Ledger(other),
            })?;
        if let Err(e) = self.ledger.finish_aggregation(block_id) {
            // The block is closed, so the next aggregation takes the marker over.
            warn!(block_id = %block_id, error = %e, "aggregation marker not released");
        }

        info!(
            block_id = %block_id,
            majority_hash = %tally.majority_hash,
            majority_count = tally.majority_count,
            total_votes = tally.total_votes,
            credited = tally.credited.len(),
            debited = tally.debited.len(),
            settled,
            rows,
            "block aggregated"
        );

        Ok(AggregationOutcome {
            block_id,
            majority_hash: tally.majority_hash,
            majority_count: tally.majority_count,
            credited_participants: tally.credited,
            debited_participants: tally.debited,
            predecessor,
        })
    }

    /// Chain continuity is reported, never enforced.
    fn predecessor(
        &self,
        linked: Option<BlockId>,
        block_id: BlockId,
    ) -> Result<Option<(BlockId, Option<BlockState>)>, ConsensusError> {
        let Some(prev) = linked.or_else(|| block_id.predecessor(self.ledger.params().window_size))
        else {
            return Ok(None);
        };
        let state = self.ledger.load_block(prev)?.map(|a| a.state());
        match state {
            Some(BlockState::Aggregated) => {}
            Some(BlockState::Open) => {
                warn!(block_id = %block_id, predecessor = %prev, "predecessor not yet aggregated")
            }
            None => warn!(block_id = %block_id, predecessor = %prev, "predecessor never opened"),
        }
        Ok(Some((prev, state)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use tally_ledger::VoteReceipt;
    use tally_nullables::NullStore;
    use tally_store::{AccountKey, AccountKind, Mutation, StoreError};
    use tally_types::LedgerParams;

    fn pid(byte: u8) -> ParticipantId {
        ParticipantId::new([byte; 32])
    }

    fn raw(byte: u8) -> String {
        pid(byte).to_string()
    }

    fn ledger() -> Ledger<NullStore> {
        Ledger::new(NullStore::new(), LedgerParams::default())
    }

    /// Block 500: AAAA from P1, P2, P3 and BBBB from P4.
    fn seed_block_500(ledger: &Ledger<NullStore>) -> BlockId {
        let block = BlockId::new(500);
        for p in 1..=3 {
            ledger.append_vote(block, b"AAAA", &raw(p)).unwrap();
        }
        ledger.append_vote(block, b"BBBB", &raw(4)).unwrap();
        block
    }

    fn totals(ledger: &Ledger<NullStore>, byte: u8) -> (u64, u64) {
        totals_of(ledger, byte)
    }

    fn totals_of<S: AccountStore>(ledger: &Ledger<S>, byte: u8) -> (u64, u64) {
        let account = ledger.read_participant(&pid(byte)).unwrap();
        (account.credit(), account.debit())
    }

    #[test]
    fn aggregates_majority_and_settles() {
        let ledger = ledger();
        let block = seed_block_500(&ledger);

        let outcome = Aggregator::new(&ledger).aggregate(block).unwrap();
        assert_eq!(outcome.majority_hash, VoteHash::from_slice(b"AAAA").unwrap());
        assert_eq!(outcome.majority_count, 3);
        assert_eq!(outcome.credited_participants, vec![pid(1), pid(2), pid(3)]);
        assert_eq!(outcome.debited_participants, vec![pid(4)]);

        for p in 1..=3 {
            assert_eq!(totals(&ledger, p), (1, 0));
        }
        assert_eq!(totals(&ledger, 4), (0, 1));
        assert_eq!(ledger.read_block(block).unwrap().state, BlockState::Aggregated);
        assert_eq!(ledger.accounting_len().unwrap(), 4);
    }

    #[test]
    fn tie_resolves_to_first_seen_hash() {
        let ledger = ledger();
        let block = BlockId::new(500);
        ledger.append_vote(block, b"AAAA", &raw(1)).unwrap();
        ledger.append_vote(block, b"BBBB", &raw(2)).unwrap();

        let outcome = Aggregator::new(&ledger).aggregate(block).unwrap();
        assert_eq!(outcome.majority_hash, VoteHash::from_slice(b"AAAA").unwrap());
        assert_eq!(totals(&ledger, 1), (1, 0));
        assert_eq!(totals(&ledger, 2), (0, 1));
    }

    #[test]
    fn second_aggregate_is_rejected() {
        let ledger = ledger();
        let block = seed_block_500(&ledger);
        let aggregator = Aggregator::new(&ledger);
        aggregator.aggregate(block).unwrap();

        assert!(matches!(
            aggregator.aggregate(block),
            Err(ConsensusError::AlreadyAggregated(b)) if b == block
        ));
        assert_eq!(totals(&ledger, 1), (1, 0));
        assert_eq!(totals(&ledger, 4), (0, 1));
        assert!(matches!(
            ledger.append_vote(block, b"AAAA", &raw(9)),
            Err(LedgerError::AlreadyAggregated(_))
        ));
    }

    #[test]
    fn majority_voter_with_minority_vote_is_only_credited() {
        let ledger = ledger();
        let block = BlockId::new(500);
        ledger.append_vote(block, b"AAAA", &raw(1)).unwrap();
        ledger.append_vote(block, b"AAAA", &raw(2)).unwrap();
        ledger.append_vote(block, b"BBBB", &raw(1)).unwrap();

        let outcome = Aggregator::new(&ledger).aggregate(block).unwrap();
        assert!(outcome.debited_participants.is_empty());
        assert_eq!(totals(&ledger, 1), (1, 0));
    }

    #[test]
    fn missing_block_is_not_found() {
        let ledger = ledger();
        assert!(matches!(
            Aggregator::new(&ledger).aggregate(BlockId::new(42)),
            Err(ConsensusError::BlockNotFound(_))
        ));
    }

    #[test]
    fn empty_block_stays_open() {
        let ledger = ledger();
        let block = BlockId::new(500);
        ledger.ensure_open(block, None).unwrap();

        assert!(matches!(
            Aggregator::new(&ledger).aggregate(block),
            Err(ConsensusError::NoVotes(_))
        ));
        assert_eq!(ledger.read_block(block).unwrap().state, BlockState::Open);
    }

    #[test]
    fn strict_majority_without_quorum_writes_nothing() {
        let ledger = ledger();
        let block = BlockId::new(500);
        ledger.append_vote(block, b"AAAA", &raw(1)).unwrap();
        ledger.append_vote(block, b"BBBB", &raw(2)).unwrap();
        let writes = ledger.store().write_count();

        let result = Aggregator::new(&ledger)
            .with_rule(QuorumRule::StrictMajority)
            .aggregate(block);
        assert!(matches!(result, Err(ConsensusError::NoQuorum { have: 1, total: 2, .. })));
        assert_eq!(ledger.store().write_count(), writes);
        assert_eq!(ledger.read_block(block).unwrap().state, BlockState::Open);
        assert_eq!(totals(&ledger, 1), (0, 0));
    }

    #[test]
    fn interrupted_aggregation_retries_without_double_settling() {
        let ledger = ledger();
        let block = seed_block_500(&ledger);

        // marker, seal and P1 commit; P2 fails
        ledger.store().fail_writes_after(3);
        assert!(matches!(
            Aggregator::new(&ledger).aggregate(block),
            Err(ConsensusError::Ledger(LedgerError::Storage(_)))
        ));
        assert_eq!(ledger.read_block(block).unwrap().state, BlockState::Open);
        assert_eq!(totals(&ledger, 1), (1, 0));
        assert_eq!(totals(&ledger, 3), (0, 0));

        ledger.store().clear_failures();
        Aggregator::new(&ledger).aggregate(block).unwrap();

        for p in 1..=3 {
            assert_eq!(totals(&ledger, p), (1, 0));
        }
        assert_eq!(totals(&ledger, 4), (0, 1));
        let rows = ledger.read_accounting_chunk(0, 10).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.credit() + r.debit() == 1));
    }

    #[test]
    fn failure_before_close_leaves_block_retryable() {
        let ledger = ledger();
        let block = seed_block_500(&ledger);

        // marker, seal, four participants and the table commit; the flip fails
        ledger.store().fail_writes_after(7);
        assert!(Aggregator::new(&ledger).aggregate(block).is_err());
        assert_eq!(ledger.read_block(block).unwrap().state, BlockState::Open);
        ledger.store().clear_failures();
        assert!(matches!(
            ledger.append_vote(block, b"BBBB", &raw(9)),
            Err(LedgerError::AggregationInProgress(_))
        ));

        Aggregator::new(&ledger).aggregate(block).unwrap();
        assert_eq!(totals(&ledger, 2), (1, 0));
        assert_eq!(totals(&ledger, 4), (0, 1));
        assert_eq!(totals(&ledger, 9), (0, 0));
        assert_eq!(ledger.read_accounting_chunk(0, 10).unwrap().len(), 4);
        assert_eq!(ledger.pending_aggregation().unwrap(), None);
    }

    #[test]
    fn unfinished_block_holds_off_the_next_one() {
        let ledger = ledger();
        let first = seed_block_500(&ledger);
        let second = BlockId::new(600);
        ledger.append_vote(second, b"CCCC", &raw(1)).unwrap();

        ledger.store().fail_writes_after(3);
        assert!(Aggregator::new(&ledger).aggregate(first).is_err());
        ledger.store().clear_failures();
        assert_eq!(totals(&ledger, 1), (1, 0));

        let writes = ledger.store().write_count();
        assert!(matches!(
            Aggregator::new(&ledger).aggregate(second),
            Err(ConsensusError::Ledger(LedgerError::AggregationPending { pending, requested }))
                if pending == first && requested == second
        ));
        assert_eq!(ledger.store().write_count(), writes);
        assert_eq!(ledger.read_block(second).unwrap().state, BlockState::Open);

        Aggregator::new(&ledger).aggregate(first).unwrap();
        Aggregator::new(&ledger).aggregate(second).unwrap();
        assert_eq!(totals(&ledger, 1), (2, 0));
        assert_eq!(totals(&ledger, 2), (1, 0));
        assert_eq!(totals(&ledger, 4), (0, 1));
    }

    #[test]
    fn unreleased_marker_of_closed_block_is_taken_over() {
        let ledger = ledger();
        let first = seed_block_500(&ledger);
        let second = BlockId::new(600);
        ledger.append_vote(second, b"CCCC", &raw(1)).unwrap();

        // everything up to the block flip commits; releasing the marker fails
        ledger.store().fail_writes_after(8);
        Aggregator::new(&ledger).aggregate(first).unwrap();
        ledger.store().clear_failures();
        assert_eq!(ledger.read_block(first).unwrap().state, BlockState::Aggregated);
        assert_eq!(ledger.pending_aggregation().unwrap(), Some(first));

        Aggregator::new(&ledger).aggregate(second).unwrap();
        assert_eq!(totals(&ledger, 1), (2, 0));
        assert_eq!(ledger.pending_aggregation().unwrap(), None);
    }

    /// Store that submits one extra vote right before the first update of a
    /// chosen account kind, as a concurrent caller would.
    struct LateVoteStore {
        inner: NullStore,
        trigger: AccountKind,
        vote: Cell<Option<(BlockId, &'static [u8], u8)>>,
        result: RefCell<Option<Result<VoteReceipt, LedgerError>>>,
    }

    impl LateVoteStore {
        fn new(trigger: AccountKind) -> Self {
            Self {
                inner: NullStore::new(),
                trigger,
                vote: Cell::new(None),
                result: RefCell::new(None),
            }
        }

        fn arm(&self, block: BlockId, hash: &'static [u8], voter: u8) {
            self.vote.set(Some((block, hash, voter)));
        }

        fn late_result(&self) -> Option<Result<VoteReceipt, LedgerError>> {
            self.result.borrow_mut().take()
        }
    }

    impl AccountStore for LateVoteStore {
        fn exists(&self, key: &AccountKey) -> Result<bool, StoreError> {
            self.inner.exists(key)
        }

        fn load(&self, key: &AccountKey) -> Result<Option<Vec<u8>>, StoreError> {
            self.inner.load(key)
        }

        fn update<T, E, F>(&self, key: &AccountKey, f: F) -> Result<T, E>
        where
            F: FnOnce(Option<&[u8]>) -> Result<Mutation<T>, E>,
            E: From<StoreError>,
        {
            if key.kind() == self.trigger {
                if let Some((block, hash, voter)) = self.vote.take() {
                    let other = Ledger::new(&self.inner, LedgerParams::default());
                    *self.result.borrow_mut() = Some(other.append_vote(block, hash, &raw(voter)));
                }
            }
            self.inner.update(key, f)
        }

        fn account_count(&self) -> Result<u64, StoreError> {
            self.inner.account_count()
        }
    }

    fn late_vote_ledger(trigger: AccountKind) -> (Ledger<LateVoteStore>, BlockId) {
        let ledger = Ledger::new(LateVoteStore::new(trigger), LedgerParams::default());
        let block = BlockId::new(500);
        for p in 1..=3 {
            ledger.append_vote(block, b"AAAA", &raw(p)).unwrap();
        }
        ledger.append_vote(block, b"BBBB", &raw(4)).unwrap();
        (ledger, block)
    }

    #[test]
    fn vote_during_settlement_is_refused() {
        let (ledger, block) = late_vote_ledger(AccountKind::Participant);
        ledger.store().arm(block, b"BBBB", 9);

        let outcome = Aggregator::new(&ledger).aggregate(block).unwrap();
        assert!(matches!(
            ledger.store().late_result(),
            Some(Err(LedgerError::AggregationInProgress(_)))
        ));

        let view = ledger.read_block(block).unwrap();
        assert_eq!(view.state, BlockState::Aggregated);
        let voters: usize = view.entries.iter().map(|e| e.voters.len()).sum();
        assert_eq!(
            outcome.credited_participants.len() + outcome.debited_participants.len(),
            voters
        );
        assert!(!ledger.participant_exists(&pid(9)).unwrap());
    }

    #[test]
    fn vote_before_seal_fails_run_and_is_settled_on_retry() {
        let (ledger, block) = late_vote_ledger(AccountKind::BlockLedger);
        ledger.store().arm(block, b"BBBB", 9);

        assert!(matches!(
            Aggregator::new(&ledger).aggregate(block),
            Err(ConsensusError::Ledger(LedgerError::BlockChanged { expected: 4, found: 5, .. }))
        ));
        assert!(matches!(ledger.store().late_result(), Some(Ok(_))));
        assert_eq!(ledger.read_block(block).unwrap().state, BlockState::Open);
        assert_eq!(ledger.pending_aggregation().unwrap(), None);
        assert_eq!(totals_of(&ledger, 1), (0, 0));

        let outcome = Aggregator::new(&ledger).aggregate(block).unwrap();
        assert_eq!(outcome.debited_participants, vec![pid(4), pid(9)]);
        assert_eq!(totals_of(&ledger, 9), (0, 1));
        assert_eq!(ledger.read_block(block).unwrap().state, BlockState::Aggregated);
    }

    #[test]
    fn reports_predecessor_state() {
        let ledger = ledger();
        let prev = seed_block_500(&ledger);
        let block = BlockId::new(600);
        ledger.append_vote(block, b"CCCC", &raw(1)).unwrap();

        let outcome = Aggregator::new(&ledger).aggregate(block).unwrap();
        assert_eq!(outcome.predecessor, Some((prev, Some(BlockState::Open))));

        let outcome = Aggregator::new(&ledger).aggregate(prev).unwrap();
        assert_eq!(outcome.predecessor, Some((BlockId::new(400), None)));

        let early = BlockId::new(50);
        ledger.append_vote(early, b"AAAA", &raw(1)).unwrap();
        assert_eq!(Aggregator::new(&ledger).aggregate(early).unwrap().predecessor, None);
    }
}
