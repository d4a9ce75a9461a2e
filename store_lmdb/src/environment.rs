//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::{LmdbAccountStore, LmdbError};

const ACCOUNTS_DB: &str = "accounts";
const MAX_DBS: u32 = 4;

/// Wraps the LMDB environment and the accounts database handle.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    accounts_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per directory by this process
        // and the memory map is never handed out beyond heed's own borrows.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let accounts_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some(ACCOUNTS_DB))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            accounts_db,
        })
    }

    /// An account store sharing this environment.
    pub fn account_store(&self) -> LmdbAccountStore {
        LmdbAccountStore {
            env: Arc::clone(&self.env),
            accounts_db: self.accounts_db,
        }
    }

    /// Flush the memory map to disk.
    pub fn force_sync(&self) -> Result<(), LmdbError> {
        self.env.force_sync()?;
        Ok(())
    }
}
