//! Account addressing.

use std::fmt;

use tally_types::{BlockId, ParticipantId};

/// The kinds of account the ledger keeps in the substrate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccountKind {
    BlockLedger,
    Participant,
    Accounting,
}

impl AccountKind {
    fn seed(self) -> &'static [u8] {
        match self {
            AccountKind::BlockLedger => b"block_ledger",
            AccountKind::Participant => b"participant",
            AccountKind::Accounting => b"accounting",
        }
    }
}

/// Substrate key of one account: a kind seed followed by the owner's bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccountKey {
    kind: AccountKind,
    bytes: Vec<u8>,
}

impl AccountKey {
    pub fn block_ledger(block_id: BlockId) -> Self {
        Self::derive(AccountKind::BlockLedger, &block_id.to_le_bytes())
    }

    pub fn participant(participant: &ParticipantId) -> Self {
        Self::derive(AccountKind::Participant, participant.as_bytes())
    }

    /// The single global voter accounting table.
    pub fn accounting() -> Self {
        Self::derive(AccountKind::Accounting, &[])
    }

    fn derive(kind: AccountKind, owner: &[u8]) -> Self {
        let seed = kind.seed();
        let mut bytes = Vec::with_capacity(seed.len() + 1 + owner.len());
        bytes.extend_from_slice(seed);
        bytes.push(b'/');
        bytes.extend_from_slice(owner);
        Self { kind, bytes }
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountKey({self})")
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seed_len = self.kind.seed().len() + 1;
        let owner = &self.bytes[seed_len..];
        let seed = String::from_utf8_lossy(&self.bytes[..seed_len]);
        write!(f, "{seed}")?;
        for b in owner {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}
