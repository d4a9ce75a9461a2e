//! Block identifier and chaining convention.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one voting round. Block ledger accounts are keyed by this id.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockId(u64);

impl BlockId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    /// The block this one chains to when blocks are spaced `window_size` apart.
    ///
    /// Returns `None` for the first window (ids below `window_size`) and when
    /// `window_size` is zero.
    pub fn predecessor(self, window_size: u64) -> Option<BlockId> {
        if window_size == 0 {
            return None;
        }
        self.0.checked_sub(window_size).map(BlockId)
    }
}

impl From<u64> for BlockId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
