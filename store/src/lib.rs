//! Abstract storage substrate for the tally consensus ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements
//! [`AccountStore`]. The rest of the codebase depends only on the trait.
//!
//! The substrate guarantees atomic read-modify-write of a single account and
//! nothing more: updates that span several accounts are ordered by the caller.

pub mod account;
pub mod error;
pub mod key;

pub use account::{AccountStore, Mutation};
pub use error::StoreError;
pub use key::{AccountKey, AccountKind};
