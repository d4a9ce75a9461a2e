//! Ledger parameters: growth policy, capacity ceilings and the chaining window.

use serde::{Deserialize, Serialize};

/// Account data ceiling: 10 MiB.
pub const DEFAULT_MAX_ACCOUNT_BYTES: usize = 10 * 1024 * 1024;

/// How a growable store enlarges its capacity once full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPolicy {
    /// Double the capacity (an empty store grows to one slot).
    #[default]
    Doubling,
    /// Add a fixed number of slots (at least one).
    Increment(usize),
}

impl GrowthPolicy {
    /// The capacity that follows `current`, before any ceiling is applied.
    pub fn next_capacity(self, current: usize) -> usize {
        match self {
            GrowthPolicy::Doubling => current.saturating_mul(2).max(1),
            GrowthPolicy::Increment(step) => current.saturating_add(step.max(1)),
        }
    }
}

/// Rule the aggregator applies before accepting the top entry as the outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumRule {
    /// The entry with the most voters wins (first seen on ties).
    #[default]
    Plurality,
    /// The top entry must also hold strictly more than half of all votes.
    StrictMajority,
}

/// Parameters shared by every ledger account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerParams {
    /// Distance between a block and its chained predecessor.
    pub window_size: u64,
    /// Capacity of a freshly created growable store.
    pub initial_capacity: usize,
    pub growth: GrowthPolicy,
    /// Ceiling on distinct hashes per block.
    pub max_hash_entries: usize,
    /// Ceiling on voters per hash.
    pub max_voters_per_hash: usize,
    /// Ceiling on rows in the voter accounting table.
    pub max_accounting_rows: usize,
    /// Ceiling on the encoded size of any single account.
    pub max_account_bytes: usize,
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            window_size: 100,
            initial_capacity: 4,
            growth: GrowthPolicy::Doubling,
            max_hash_entries: 4096,
            max_voters_per_hash: 8192,
            max_accounting_rows: 262_144,
            max_account_bytes: DEFAULT_MAX_ACCOUNT_BYTES,
        }
    }
}
