//! Account storage trait.

use crate::{AccountKey, StoreError};

/// The result of a read-modify-write closure.
///
/// `data: None` leaves the stored account untouched; `output` is handed back
/// to the caller either way.
#[derive(Debug)]
pub struct Mutation<T> {
    pub data: Option<Vec<u8>>,
    pub output: T,
}

impl<T> Mutation<T> {
    /// Replace the account data with `data`.
    pub fn write(data: Vec<u8>, output: T) -> Self {
        Self {
            data: Some(data),
            output,
        }
    }

    /// Leave the account as it is.
    pub fn keep(output: T) -> Self {
        Self { data: None, output }
    }
}

/// Trait for the per-account storage substrate.
///
/// Accounts are opaque byte blobs addressed by [`AccountKey`]. Implementations
/// must linearize [`AccountStore::update`] calls on the same key: the closure
/// observes the latest committed data, and no other writer to that account can
/// interleave between its read and its write.
pub trait AccountStore {
    /// Whether an account exists under `key`.
    fn exists(&self, key: &AccountKey) -> Result<bool, StoreError>;

    /// Read an account's data, if present.
    fn load(&self, key: &AccountKey) -> Result<Option<Vec<u8>>, StoreError>;

    /// Atomically read, transform and write back one account.
    ///
    /// When `f` fails nothing is written and its error is returned unchanged.
    fn update<T, E, F>(&self, key: &AccountKey, f: F) -> Result<T, E>
    where
        F: FnOnce(Option<&[u8]>) -> Result<Mutation<T>, E>,
        E: From<StoreError>;

    /// Number of accounts held by the substrate.
    fn account_count(&self) -> Result<u64, StoreError>;
}

impl<S: AccountStore + ?Sized> AccountStore for &S {
    fn exists(&self, key: &AccountKey) -> Result<bool, StoreError> {
        (**self).exists(key)
    }

    fn load(&self, key: &AccountKey) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).load(key)
    }

    fn update<T, E, F>(&self, key: &AccountKey, f: F) -> Result<T, E>
    where
        F: FnOnce(Option<&[u8]>) -> Result<Mutation<T>, E>,
        E: From<StoreError>,
    {
        (**self).update(key, f)
    }

    fn account_count(&self) -> Result<u64, StoreError> {
        (**self).account_count()
    }
}
