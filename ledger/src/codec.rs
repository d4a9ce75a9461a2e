//! Account encoding.
//!
//! Every account is stored as one kind tag byte followed by its `bincode`
//! body. The tag guards against decoding one kind of account as another.
//! Encoded accounts are bounded by the configured account-size ceiling.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{BlockLedgerAccount, LedgerError, ParticipantAccount, VoterAccountingTable};

pub trait LedgerAccount: Serialize + DeserializeOwned {
    const TAG: u8;
    const NAME: &'static str;
}

impl LedgerAccount for BlockLedgerAccount {
    const TAG: u8 = 1;
    const NAME: &'static str = "block ledger account";
}

impl LedgerAccount for ParticipantAccount {
    const TAG: u8 = 2;
    const NAME: &'static str = "participant account";
}

impl LedgerAccount for VoterAccountingTable {
    const TAG: u8 = 3;
    const NAME: &'static str = "voter accounting table";
}

pub fn encode<A: LedgerAccount>(account: &A, max_bytes: usize) -> Result<Vec<u8>, LedgerError> {
    let body = bincode::serialize(account).map_err(|e| LedgerError::Codec(e.to_string()))?;
    let len = body.len() + 1;
    if len > max_bytes {
        return Err(LedgerError::CapacityExceeded {
            what: A::NAME,
            limit: max_bytes,
        });
    }
    let mut data = Vec::with_capacity(len);
    data.push(A::TAG);
    data.extend_from_slice(&body);
    Ok(data)
}

pub fn decode<A: LedgerAccount>(data: &[u8]) -> Result<A, LedgerError> {
    match data.split_first() {
        Some((tag, body)) if *tag == A::TAG => {
            bincode::deserialize(body).map_err(|e| LedgerError::Codec(e.to_string()))
        }
        Some((tag, _)) => Err(LedgerError::Codec(format!(
            "expected {} (tag {}), found tag {}",
            A::NAME,
            A::TAG,
            tag
        ))),
        None => Err(LedgerError::Codec(format!("empty {}", A::NAME))),
    }
}
