//! Nullable store: thread-safe in-memory storage for testing.

use std::collections::BTreeMap;
use std::sync::Mutex;

use tally_store::{AccountKey, AccountStore, Mutation, StoreError};

/// An in-memory account store.
///
/// A single mutex guards all accounts, so every `update` closure runs with
/// exclusive access, as LMDB's single writer does.
pub struct NullStore {
    accounts: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
    /// Remaining successful writes before injected failures start.
    write_budget: Mutex<Option<usize>>,
    writes: Mutex<u64>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(BTreeMap::new()),
            write_budget: Mutex::new(None),
            writes: Mutex::new(0),
        }
    }

    /// Allow `n` more writes, then fail every write with a backend error.
    pub fn fail_writes_after(&self, n: usize) {
        *self.write_budget.lock().unwrap() = Some(n);
    }

    /// Stop injecting write failures.
    pub fn clear_failures(&self) {
        *self.write_budget.lock().unwrap() = None;
    }

    /// Total number of committed writes.
    pub fn write_count(&self) -> u64 {
        *self.writes.lock().unwrap()
    }

    fn take_write_permit(&self) -> Result<(), StoreError> {
        let mut budget = self.write_budget.lock().unwrap();
        match budget.as_mut() {
            Some(0) => Err(StoreError::Backend("injected write failure".into())),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for NullStore {
    fn exists(&self, key: &AccountKey) -> Result<bool, StoreError> {
        Ok(self.accounts.lock().unwrap().contains_key(key.as_bytes()))
    }

    fn load(&self, key: &AccountKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.accounts.lock().unwrap().get(key.as_bytes()).cloned())
    }

    fn update<T, E, F>(&self, key: &AccountKey, f: F) -> Result<T, E>
    where
        F: FnOnce(Option<&[u8]>) -> Result<Mutation<T>, E>,
        E: From<StoreError>,
    {
        let mut accounts = self.accounts.lock().unwrap();
        let mutation = f(accounts.get(key.as_bytes()).map(Vec::as_slice))?;
        if let Some(data) = mutation.data {
            self.take_write_permit()?;
            accounts.insert(key.as_bytes().to_vec(), data);
            *self.writes.lock().unwrap() += 1;
        }
        Ok(mutation.output)
    }

    fn account_count(&self) -> Result<u64, StoreError> {
        Ok(self.accounts.lock().unwrap().len() as u64)
    }
}
