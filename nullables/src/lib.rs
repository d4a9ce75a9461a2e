//! Nullable infrastructure for deterministic testing.
//!
//! The storage substrate is abstracted behind [`tally_store::AccountStore`].
//! This crate provides a test-friendly implementation that:
//! - Never touches the filesystem
//! - Linearizes updates exactly like a real backend
//! - Can be told to start failing writes, to simulate a crash part-way
//!   through a multi-account operation
//!
//! Usage: swap the LMDB store for [`NullStore`] in tests.

pub mod store;

pub use store::NullStore;
