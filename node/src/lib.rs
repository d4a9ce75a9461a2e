//! Tally node: wires configuration, storage, the ledger and the aggregator.
//!
//! The node is the library surface a transport layer embeds:
//! - Loads [`NodeConfig`] from TOML
//! - Opens the configured storage backend (LMDB or in-memory)
//! - Installs structured logging
//! - Exposes the ledger and aggregation operations through [`TallyNode`]

pub mod config;
pub mod error;
pub mod logging;
pub mod node;

pub use config::{NodeConfig, StorageBackend};
pub use error::NodeError;
pub use logging::{init_logging, try_init_logging, LogFormat};
pub use node::{NodeStore, TallyNode};
