//! Participant identity checks at the ledger boundary.

use tally_types::ParticipantId;

use crate::LedgerError;

/// Turns a caller-supplied identity into a [`ParticipantId`].
///
/// Checks are structural only; proving ownership of an identity is the
/// transport layer's job.
pub trait ParticipantValidator: Send + Sync {
    fn validate(&self, raw: &str) -> Result<ParticipantId, LedgerError>;
}

/// Accepts any well-formed, non-zero 32-byte hex identity.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralValidator;

impl ParticipantValidator for StructuralValidator {
    fn validate(&self, raw: &str) -> Result<ParticipantId, LedgerError> {
        ParticipantId::parse(raw).map_err(|e| LedgerError::UnknownParticipant(e.to_string()))
    }
}
