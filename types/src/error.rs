//! Errors raised while constructing the fundamental types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid participant identity: {0}")]
    InvalidParticipant(String),

    #[error("invalid vote hash: {0}")]
    InvalidHash(String),
}
