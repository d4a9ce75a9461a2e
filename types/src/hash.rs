//! Fixed-size vote digest.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// Width of a vote digest in bytes.
pub const VOTE_HASH_LEN: usize = 8;

/// The digest a participant votes for within a block.
///
/// Submitted digests are right-padded with zeros or truncated to
/// [`VOTE_HASH_LEN`] bytes, so two submissions sharing the same first eight
/// bytes count as the same vote.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoteHash([u8; VOTE_HASH_LEN]);

impl VoteHash {
    pub const fn new(bytes: [u8; VOTE_HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a digest from arbitrary submitted bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        if bytes.is_empty() {
            return Err(TypesError::InvalidHash("empty digest".into()));
        }
        let mut out = [0u8; VOTE_HASH_LEN];
        let n = bytes.len().min(VOTE_HASH_LEN);
        out[..n].copy_from_slice(&bytes[..n]);
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; VOTE_HASH_LEN] {
        &self.0
    }
}

impl fmt::Debug for VoteHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoteHash({})", hex::encode(self.0))
    }
}

impl fmt::Display for VoteHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
