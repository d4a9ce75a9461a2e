//! LMDB implementation of AccountStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use tally_store::{AccountKey, AccountStore, Mutation, StoreError};

use crate::LmdbError;

pub struct LmdbAccountStore {
    pub(crate) env: Arc<Env>,
    pub(crate) accounts_db: Database<Bytes, Bytes>,
}

fn backend<E: From<StoreError>>(e: heed::Error) -> E {
    E::from(StoreError::from(LmdbError::from(e)))
}

impl AccountStore for LmdbAccountStore {
    fn exists(&self, key: &AccountKey) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .accounts_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn load(&self, key: &AccountKey) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .accounts_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(<[u8]>::to_vec))
    }

    fn update<T, E, F>(&self, key: &AccountKey, f: F) -> Result<T, E>
    where
        F: FnOnce(Option<&[u8]>) -> Result<Mutation<T>, E>,
        E: From<StoreError>,
    {
        // LMDB admits one write transaction at a time, so the read below and
        // the put that follows cannot interleave with another writer.
        let mut wtxn = self.env.write_txn().map_err(backend::<E>)?;
        let current = self
            .accounts_db
            .get(&wtxn, key.as_bytes())
            .map_err(backend::<E>)?
            .map(<[u8]>::to_vec);

        let mutation = f(current.as_deref())?;

        if let Some(data) = mutation.data {
            self.accounts_db
                .put(&mut wtxn, key.as_bytes(), &data)
                .map_err(backend::<E>)?;
            wtxn.commit().map_err(backend::<E>)?;
            tracing::trace!(key = %key, kind = ?key.kind(), len = data.len(), "account written");
        }
        Ok(mutation.output)
    }

    fn account_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.accounts_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
