//! The tally node: configuration, storage and ledger operations wired together.

use tally_consensus::{AggregationOutcome, Aggregator};
use tally_ledger::{
    BlockView, Ledger, OpenStatus, ParticipantAccount, VoteReceipt, VoterAccountingRow,
};
use tally_nullables::NullStore;
use tally_store::{AccountKey, AccountStore, Mutation, StoreError};
use tally_store_lmdb::{LmdbAccountStore, LmdbEnvironment};
use tally_types::{BlockId, ParticipantId, QuorumRule};
use tracing::info;

use crate::config::{NodeConfig, StorageBackend};
use crate::error::NodeError;

/// The storage backend selected by [`NodeConfig::storage`].
pub enum NodeStore {
    Lmdb {
        env: LmdbEnvironment,
        store: LmdbAccountStore,
    },
    Memory(NullStore),
}

impl NodeStore {
    pub fn open(config: &NodeConfig) -> Result<Self, NodeError> {
        match config.storage {
            StorageBackend::Lmdb => {
                let env = LmdbEnvironment::open(&config.data_dir, config.map_size)?;
                let store = env.account_store();
                Ok(NodeStore::Lmdb { env, store })
            }
            StorageBackend::Memory => Ok(NodeStore::Memory(NullStore::new())),
        }
    }

    /// Flush durable storage. A no-op in memory.
    pub fn sync(&self) -> Result<(), NodeError> {
        if let NodeStore::Lmdb { env, .. } = self {
            env.force_sync()?;
        }
        Ok(())
    }
}

impl AccountStore for NodeStore {
    fn exists(&self, key: &AccountKey) -> Result<bool, StoreError> {
        match self {
            NodeStore::Lmdb { store, .. } => store.exists(key),
            NodeStore::Memory(store) => store.exists(key),
        }
    }

    fn load(&self, key: &AccountKey) -> Result<Option<Vec<u8>>, StoreError> {
        match self {
            NodeStore::Lmdb { store, .. } => store.load(key),
            NodeStore::Memory(store) => store.load(key),
        }
    }

    fn update<T, E, F>(&self, key: &AccountKey, f: F) -> Result<T, E>
    where
        F: FnOnce(Option<&[u8]>) -> Result<Mutation<T>, E>,
        E: From<StoreError>,
    {
        match self {
            NodeStore::Lmdb { store, .. } => store.update(key, f),
            NodeStore::Memory(store) => store.update(key, f),
        }
    }

    fn account_count(&self) -> Result<u64, StoreError> {
        match self {
            NodeStore::Lmdb { store, .. } => store.account_count(),
            NodeStore::Memory(store) => store.account_count(),
        }
    }
}

/// Ledger operations behind one handle.
///
/// Boundary inputs (raw hash bytes, textual participant ids) are accepted
/// here and validated by the ledger before anything is written.
pub struct TallyNode<S = NodeStore> {
    ledger: Ledger<S>,
    quorum: QuorumRule,
}

impl TallyNode<NodeStore> {
    /// Open the configured storage backend and build a node over it.
    pub fn open(config: &NodeConfig) -> Result<Self, NodeError> {
        let store = NodeStore::open(config)?;
        info!(
            storage = ?config.storage,
            data_dir = %config.data_dir.display(),
            quorum = ?config.quorum,
            "tally node opened"
        );
        Ok(Self::new(store, config))
    }

    pub fn sync(&self) -> Result<(), NodeError> {
        self.ledger.store().sync()
    }
}

impl<S: AccountStore> TallyNode<S> {
    pub fn new(store: S, config: &NodeConfig) -> Self {
        Self {
            ledger: Ledger::new(store, config.ledger_params()),
            quorum: config.quorum,
        }
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub fn ensure_open(
        &self,
        block_id: u64,
        previous: Option<u64>,
    ) -> Result<OpenStatus, NodeError> {
        Ok(self
            .ledger
            .ensure_open(BlockId::new(block_id), previous.map(BlockId::new))?)
    }

    pub fn append_vote(
        &self,
        block_id: u64,
        hash: &[u8],
        participant: &str,
    ) -> Result<VoteReceipt, NodeError> {
        Ok(self
            .ledger
            .append_vote(BlockId::new(block_id), hash, participant)?)
    }

    pub fn read_block(&self, block_id: u64) -> Result<BlockView, NodeError> {
        Ok(self.ledger.read_block(BlockId::new(block_id))?)
    }

    pub fn aggregate(&self, block_id: u64) -> Result<AggregationOutcome, NodeError> {
        Ok(Aggregator::new(&self.ledger)
            .with_rule(self.quorum)
            .aggregate(BlockId::new(block_id))?)
    }

    pub fn read_participant(&self, participant: &str) -> Result<ParticipantAccount, NodeError> {
        let participant = ParticipantId::parse(participant)?;
        Ok(self.ledger.read_participant(&participant)?)
    }

    pub fn read_accounting_chunk(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<VoterAccountingRow>, NodeError> {
        Ok(self.ledger.read_accounting_chunk(offset, limit)?)
    }

    pub fn accounting_len(&self) -> Result<u64, NodeError> {
        Ok(self.ledger.accounting_len()?)
    }
}
