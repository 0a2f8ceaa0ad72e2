//! # Group Context
//!
//! Each served group owns one [`GroupContext`]: its chain and UTXO set
//! behind a single async `RwLock`, plus its mempool. The lock is the
//! atomicity boundary for "append block, advance UTXO set": nobody reads
//! one without the other having caught up.

use crate::domain::errors::SyncError;
use parking_lot::{Mutex, MutexGuard, RwLock};
use shared_types::{hash_prefix, Block, GroupId, VersionInfo};
use sl_01_group_router::GroupRouter;
use sl_02_chain_store::{BlockHeadStore, ChainStore, DynStore, InMemoryKVStore};
use sl_03_utxo_set::UtxoSet;
use sl_04_mempool::{MempoolConfig, TransactionPool};
use sl_05_merkle_relay::verify_block;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Which byte store a caller is asking the factory for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreScope {
    /// Blocks and indexes of one group.
    Chain(GroupId),
    /// Unspent outputs of one group.
    Utxo(GroupId),
    /// Block heads of every group.
    Heads,
}

impl fmt::Display for StoreScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chain(group) => write!(f, "chain-{group}"),
            Self::Utxo(group) => write!(f, "utxo-{group}"),
            Self::Heads => write!(f, "heads"),
        }
    }
}

/// Chain + UTXO set of one group. Only reachable through the group lock.
pub struct GroupLedger {
    /// Block ledger.
    pub chain: ChainStore<DynStore>,
    /// Unspent outputs owned by this group.
    pub utxo: UtxoSet<DynStore>,
}

impl GroupLedger {
    /// Group this ledger belongs to.
    pub fn group(&self) -> GroupId {
        self.utxo.group()
    }

    /// Tip height, `None` before genesis.
    pub fn height(&self) -> Result<Option<u32>, SyncError> {
        Ok(self.chain.height()?)
    }

    /// `(height, genesis, tip)` summary, `None` before genesis.
    pub fn version_info(&self) -> Result<Option<VersionInfo>, SyncError> {
        let (Some(genesis), Some(tip)) = (self.chain.genesis()?, self.chain.tip()?) else {
            return Ok(None);
        };
        Ok(Some(VersionInfo {
            group: self.group(),
            height: tip.height,
            genesis_hash: genesis.hash(),
            tip_hash: tip.hash(),
        }))
    }

    fn check_group(&self, block: &Block) -> Result<(), SyncError> {
        if block.group != self.group() {
            return Err(SyncError::WrongGroup {
                expected: self.group(),
                actual: block.group,
            });
        }
        Ok(())
    }

    /// Install `genesis` into an empty chain and rebuild the UTXO set.
    /// Returns false when a genesis is already present.
    pub fn install_genesis(&mut self, genesis: &Block, min_bits: u32) -> Result<bool, SyncError> {
        if self.chain.height()?.is_some() {
            return Ok(false);
        }
        if !genesis.is_genesis() {
            return Err(SyncError::NotGenesis(genesis.height));
        }
        self.check_group(genesis)?;
        verify_block(genesis, min_bits)?;

        self.chain.append(genesis)?;
        if let Err(err) = self.utxo.reindex(&self.chain) {
            self.chain.delete_tip()?;
            return Err(err.into());
        }
        info!(
            "[sl-06] group {} genesis {} installed",
            self.group(),
            hash_prefix(&genesis.hash())
        );
        Ok(true)
    }

    /// Verify `block` and append it on the tip, advancing the UTXO set.
    /// Nothing is written unless every check passes.
    ///
    /// A transaction may sit on the active chain once. Relayed
    /// transactions spend no output of this group, so the UTXO check
    /// alone would let them in again.
    pub fn apply_block(&mut self, block: &Block, min_bits: u32) -> Result<(), SyncError> {
        self.check_group(block)?;
        verify_block(block, min_bits)?;
        for txn in &block.txns {
            let hash = txn.hash();
            if self.chain.contains_txn(&hash)? {
                return Err(SyncError::AlreadyIncluded(hash));
            }
        }
        self.utxo.verify_block(block)?;
        self.chain.append(block)?;
        self.utxo.update(block)?;
        Ok(())
    }
}

/// Everything one served group owns.
pub struct GroupContext {
    group: GroupId,
    ledger: tokio::sync::RwLock<GroupLedger>,
    mempool: Mutex<TransactionPool>,
}

impl GroupContext {
    /// Build a context over the given chain and UTXO byte stores.
    pub fn new(
        group: GroupId,
        max_group_num: u32,
        chain_store: DynStore,
        utxo_store: DynStore,
        mempool: MempoolConfig,
    ) -> Self {
        Self {
            group,
            ledger: tokio::sync::RwLock::new(GroupLedger {
                chain: ChainStore::new(chain_store),
                utxo: UtxoSet::new(utxo_store, group, max_group_num),
            }),
            mempool: Mutex::new(TransactionPool::new(mempool)),
        }
    }

    /// Context backed by in-memory stores.
    pub fn in_memory(group: GroupId, max_group_num: u32, mempool: MempoolConfig) -> Self {
        Self::new(
            group,
            max_group_num,
            Box::new(InMemoryKVStore::new()),
            Box::new(InMemoryKVStore::new()),
            mempool,
        )
    }

    /// Group id.
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Shared access to chain + UTXO set.
    pub async fn read(&self) -> RwLockReadGuard<'_, GroupLedger> {
        self.ledger.read().await
    }

    /// Exclusive access to chain + UTXO set.
    pub async fn write(&self) -> RwLockWriteGuard<'_, GroupLedger> {
        self.ledger.write().await
    }

    /// The group's mempool. Never hold this guard across an await.
    pub fn mempool(&self) -> MutexGuard<'_, TransactionPool> {
        self.mempool.lock()
    }

    /// Drop pooled transactions that `block` included or conflicts with.
    pub fn purge_mempool(&self, block: &Block) {
        let dropped = self.mempool.lock().remove_included(block);
        if dropped > 0 {
            debug!(
                "[sl-06] group {} purged {} pooled transactions after block {}",
                self.group,
                dropped,
                block.height
            );
        }
    }
}

/// State of one node: its router, its served groups and the shared head
/// store.
pub struct NodeState {
    router: GroupRouter,
    groups: HashMap<GroupId, Arc<GroupContext>>,
    heads: RwLock<BlockHeadStore<DynStore>>,
}

impl NodeState {
    /// Open every store through `open_store`.
    pub fn open<F, E>(router: GroupRouter, mempool: MempoolConfig, mut open_store: F) -> Result<Self, E>
    where
        F: FnMut(StoreScope) -> Result<DynStore, E>,
    {
        let max = router.max_group_num();
        let mut groups = HashMap::new();
        for group in router.served_groups() {
            let context = GroupContext::new(
                group,
                max,
                open_store(StoreScope::Chain(group))?,
                open_store(StoreScope::Utxo(group))?,
                mempool.clone(),
            );
            groups.insert(group, Arc::new(context));
        }
        let heads = BlockHeadStore::new(open_store(StoreScope::Heads)?);
        Ok(Self {
            router,
            groups,
            heads: RwLock::new(heads),
        })
    }

    /// State with in-memory stores for every served group.
    pub fn in_memory(router: GroupRouter, mempool: MempoolConfig) -> Self {
        let opened: Result<Self, std::convert::Infallible> =
            Self::open(router, mempool, |_| Ok(Box::new(InMemoryKVStore::new())));
        match opened {
            Ok(state) => state,
            Err(never) => match never {},
        }
    }

    /// Group router.
    pub fn router(&self) -> &GroupRouter {
        &self.router
    }

    /// Context of a served group.
    pub fn group(&self, group: GroupId) -> Result<Arc<GroupContext>, SyncError> {
        self.groups
            .get(&group)
            .cloned()
            .ok_or(SyncError::GroupNotServed(group))
    }

    /// Served groups in window order.
    pub fn served_groups(&self) -> Vec<GroupId> {
        self.router.served_groups()
    }

    /// Head store shared by all groups.
    pub fn heads(&self) -> &RwLock<BlockHeadStore<DynStore>> {
        &self.heads
    }

    /// Record the head of an accepted block so relays out of it verify
    /// locally. Returns whether it was new.
    pub fn record_head(&self, block: &Block) -> Result<bool, SyncError> {
        Ok(self.heads.write().insert(block)?)
    }
}
