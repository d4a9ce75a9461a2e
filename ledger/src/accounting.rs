//! Global voter accounting table.
//!
//! A denormalized mirror of every [`ParticipantAccount`], one row per
//! participant in first-settled order, readable in chunks.
//!
//! The table also carries the in-flight aggregation marker. Settlement spans
//! several accounts, so the block being settled is recorded here until its
//! aggregation finishes, and no other block may start settling meanwhile.

use serde::{Deserialize, Serialize};
use tally_types::{BlockId, LedgerParams, ParticipantId};

use crate::{GrowableStore, LedgerError, ParticipantAccount, Verdict};

/// Rows share the participant account's shape.
pub type VoterAccountingRow = ParticipantAccount;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterAccountingTable {
    rows: GrowableStore<VoterAccountingRow>,
    pending: Option<BlockId>,
}

impl VoterAccountingTable {
    pub fn new(params: &LedgerParams) -> Self {
        Self {
            rows: GrowableStore::new(
                params.initial_capacity,
                params.max_accounting_rows,
                params.growth,
            ),
            pending: None,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The block whose aggregation started and has not finished.
    pub fn pending(&self) -> Option<BlockId> {
        self.pending
    }

    pub fn begin(&mut self, block: BlockId) {
        self.pending = Some(block);
    }

    /// Clear the marker if it names `block`.
    pub fn finish(&mut self, block: BlockId) -> bool {
        if self.pending != Some(block) {
            return false;
        }
        self.pending = None;
        true
    }

    pub fn row(&self, participant: &ParticipantId) -> Option<&VoterAccountingRow> {
        self.rows.iter().find(|r| r.participant() == *participant)
    }

    /// Rows `offset..offset + limit`, clamped to the table.
    pub fn chunk(&self, offset: usize, limit: usize) -> &[VoterAccountingRow] {
        let rows = self.rows.as_slice();
        let start = offset.min(rows.len());
        let end = start.saturating_add(limit).min(rows.len());
        &rows[start..end]
    }

    /// Apply `verdict` to `participant`'s row, creating the row if needed.
    pub fn settle(
        &mut self,
        participant: ParticipantId,
        verdict: Verdict,
        block: BlockId,
    ) -> Result<bool, LedgerError> {
        if let Some(index) = self.rows.position(|r| r.participant() == participant) {
            let applied = self
                .rows
                .get_mut(index)
                .map(|row| row.settle(verdict, block))
                .unwrap_or(false);
            return Ok(applied);
        }

        let mut row = ParticipantAccount::new(participant);
        row.settle(verdict, block);
        self.rows
            .append(row)
            .map_err(|e| LedgerError::capacity("voter accounting rows", e))?;
        Ok(true)
    }
}
