//! LMDB storage backend for the tally consensus ledger.
//!
//! Implements [`tally_store::AccountStore`] using the `heed` LMDB bindings.
//! All accounts live in one named database inside a single environment, and
//! every read-modify-write runs inside one LMDB write transaction, which LMDB
//! serializes across threads and processes.

pub mod account;
pub mod environment;
pub mod error;

pub use account::LmdbAccountStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
