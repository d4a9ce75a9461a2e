//! Fundamental types for the tally consensus ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! block identifiers, vote digests, participant identities and ledger parameters.

pub mod block;
pub mod error;
pub mod hash;
pub mod params;
pub mod participant;

pub use block::BlockId;
pub use error::TypesError;
pub use hash::{VoteHash, VOTE_HASH_LEN};
pub use params::{GrowthPolicy, LedgerParams, QuorumRule, DEFAULT_MAX_ACCOUNT_BYTES};
pub use participant::ParticipantId;
