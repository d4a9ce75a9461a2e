//! Growable block ledger.
//!
//! Each voting round owns one block ledger account that grows as votes
//! arrive: distinct hashes are kept in first-seen order, and each hash keeps a
//! deduplicated, insertion-ordered voter set. Participants have their own
//! credit/debit accounts, mirrored into one global accounting table.
//!
//! ## Module overview
//!
//! - [`growable`] — append-only container with explicit capacity growth.
//! - [`hash_entry`] — per-hash voter set with idempotent re-votes.
//! - [`block_account`] — per-block state machine (Open → Aggregated).
//! - [`participant`] — per-participant credit/debit account.
//! - [`accounting`] — global voter accounting table.
//! - [`codec`] — tagged `bincode` encoding of accounts with a size ceiling.
//! - [`ledger`] — operations over a storage substrate.
//! - [`validator`] — structural participant identity checks.
//! - [`view`] — read-only shapes returned to callers.

pub mod accounting;
pub mod block_account;
pub mod codec;
pub mod error;
pub mod growable;
pub mod hash_entry;
pub mod ledger;
pub mod participant;
pub mod validator;
pub mod view;

pub use accounting::{VoterAccountingRow, VoterAccountingTable};
pub use block_account::{BlockLedgerAccount, BlockState, VoteReceipt};
pub use error::LedgerError;
pub use growable::{CapacityExceeded, GrowableStore};
pub use hash_entry::{HashVoteEntry, VoteOutcome};
pub use ledger::{Ledger, OpenStatus};
pub use participant::{ParticipantAccount, Verdict};
pub use validator::{ParticipantValidator, StructuralValidator};
pub use view::{BlockView, EntryView};
