//! Participant identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A 32-byte voter identity, written as 64 hex characters.
///
/// The all-zero identity is reserved as the "unset" marker and never names a
/// real participant.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId([u8; 32]);

impl ParticipantId {
    pub const UNSET: Self = Self([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Structural validity only: no signature or ownership checks happen here.
    pub fn is_valid(&self) -> bool {
        *self != Self::UNSET
    }

    /// Parse the hex form, rejecting malformed and unset identities.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let raw = raw.trim();
        if raw.len() != 64 {
            return Err(TypesError::InvalidParticipant(format!(
                "expected 64 hex characters, got {}",
                raw.len()
            )));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(raw, &mut bytes)
            .map_err(|e| TypesError::InvalidParticipant(e.to_string()))?;
        let id = Self(bytes);
        if !id.is_valid() {
            return Err(TypesError::InvalidParticipant("unset identity".into()));
        }
        Ok(id)
    }
}

impl FromStr for ParticipantId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantId({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
