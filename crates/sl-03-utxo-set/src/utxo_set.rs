//! # UTXO Set
//!
//! Group-scoped index of unspent outputs with an owner index.
//!
//! Block application is staged against an in-memory overlay and committed
//! as one atomic batch, so a block that fails half-way leaves no trace.
//! Transactions are applied in block order; a later transaction may spend
//! an output created earlier in the same block.

use crate::domain::keys::{outpoint_from_owner_key, owner_key, owner_prefix, utxo_key, UTXO_PREFIX};
use crate::domain::UtxoError;
use shared_crypto::PubKeyHash;
use shared_types::{hash_prefix, Block, GroupId, OutPoint, Transaction, TxnOutput};
use sl_01_group_router::group_of;
use sl_02_chain_store::{BatchOperation, ChainStore, KeyValueStore};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

type Result<T> = std::result::Result<T, UtxoError>;

/// Unspent outputs of one group.
pub struct UtxoSet<S: KeyValueStore> {
    store: S,
    group: GroupId,
    max_group_num: u32,
}

/// Pending writes of a block being applied or reversed.
#[derive(Default)]
struct Staging {
    overlay: HashMap<OutPoint, Option<TxnOutput>>,
    ops: Vec<BatchOperation>,
}

impl Staging {
    fn insert(&mut self, outpoint: OutPoint, output: TxnOutput) -> Result<()> {
        self.ops.push(BatchOperation::put(
            utxo_key(&outpoint),
            bincode::serialize(&output)?,
        ));
        self.ops
            .push(BatchOperation::put(owner_key(&output.pub_key_hash, &outpoint), Vec::new()));
        self.overlay.insert(outpoint, Some(output));
        Ok(())
    }

    fn remove(&mut self, outpoint: OutPoint, output: &TxnOutput) {
        self.ops.push(BatchOperation::delete(utxo_key(&outpoint)));
        self.ops
            .push(BatchOperation::delete(owner_key(&output.pub_key_hash, &outpoint)));
        self.overlay.insert(outpoint, None);
    }
}

impl<S: KeyValueStore> UtxoSet<S> {
    /// Create the set of `group` over a byte store.
    pub fn new(store: S, group: GroupId, max_group_num: u32) -> Self {
        Self {
            store,
            group,
            max_group_num,
        }
    }

    /// Group this set belongs to.
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Underlying byte store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether outputs of `owner` are tracked here.
    pub fn tracks(&self, owner: &PubKeyHash) -> bool {
        group_of(owner, self.max_group_num) == self.group
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// The unspent output at `outpoint`.
    pub fn get(&self, outpoint: &OutPoint) -> Result<Option<TxnOutput>> {
        match self.store.get(&utxo_key(outpoint))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Whether `outpoint` is unspent.
    pub fn is_unspent(&self, outpoint: &OutPoint) -> Result<bool> {
        Ok(self.store.exists(&utxo_key(outpoint))?)
    }

    /// Every unspent output locked to `owner`.
    pub fn find_utxo_by_hash(&self, owner: &PubKeyHash) -> Result<Vec<(OutPoint, TxnOutput)>> {
        let mut found = Vec::new();
        for (key, _) in self.store.prefix_scan(&owner_prefix(owner))? {
            let Some(outpoint) = outpoint_from_owner_key(&key) else {
                continue;
            };
            if let Some(output) = self.get(&outpoint)? {
                found.push((outpoint, output));
            }
        }
        Ok(found)
    }

    /// Sum of unspent outputs locked to `owner`.
    pub fn balance(&self, owner: &PubKeyHash) -> Result<i64> {
        Ok(self
            .find_utxo_by_hash(owner)?
            .iter()
            .map(|(_, output)| output.value)
            .sum())
    }

    /// Number of unspent outputs.
    pub fn len(&self) -> Result<usize> {
        Ok(self.store.prefix_scan(&[UTXO_PREFIX])?.len())
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn staged(&self, staging: &Staging, outpoint: &OutPoint) -> Result<Option<TxnOutput>> {
        match staging.overlay.get(outpoint) {
            Some(entry) => Ok(entry.clone()),
            None => self.get(outpoint),
        }
    }

    /// Mempool-time check of a loose transaction: not a coinbase, every
    /// input spends an output that is unspent here and not claimed by
    /// another pending transaction, and values and signatures verify.
    ///
    /// Advisory only; block acceptance checks again.
    pub fn mem_verify_transaction<F>(&self, txn: &Transaction, is_claimed: F) -> Result<()>
    where
        F: Fn(&OutPoint) -> bool,
    {
        if txn.is_coinbase() {
            return Err(UtxoError::CoinbaseNotAllowed);
        }

        let mut referenced = HashMap::new();
        for outpoint in txn.spent_outpoints() {
            if is_claimed(&outpoint) {
                return Err(UtxoError::AlreadyClaimed(outpoint));
            }
            if let Some(output) = self.get(&outpoint)? {
                referenced.insert(outpoint, output);
            }
        }
        txn.verify(&referenced)?;
        Ok(())
    }

    // =========================================================================
    // BLOCK APPLICATION
    // =========================================================================

    fn stage_update(&self, block: &Block, verify: bool) -> Result<Staging> {
        let mut staging = Staging::default();
        let mut seen = HashSet::with_capacity(block.txns.len());

        for (position, txn) in block.txns.iter().enumerate() {
            let txn_hash = txn.hash();
            if verify && !seen.insert(txn_hash) {
                return Err(UtxoError::RepeatedTxn(txn_hash));
            }

            if txn.is_coinbase() {
                if verify && position != 0 {
                    return Err(UtxoError::MisplacedCoinbase(position));
                }
            } else {
                let mut referenced = HashMap::new();
                let mut spends_here = false;
                for input in &txn.vin {
                    let Some(outpoint) = input.outpoint() else {
                        continue;
                    };
                    match self.staged(&staging, &outpoint)? {
                        Some(output) => {
                            staging.remove(outpoint, &output);
                            referenced.insert(outpoint, output);
                        }
                        None if self.tracks(&input.owner()) => {
                            return Err(UtxoError::MissingSpentOutput(outpoint));
                        }
                        None => continue,
                    }
                    spends_here = true;
                }
                // Transactions spending only foreign outputs arrived by
                // relay and were proven against the source group's head.
                if verify && spends_here {
                    txn.verify(&referenced)?;
                }
            }

            for (index, output) in txn.vout.iter().enumerate() {
                if self.tracks(&output.pub_key_hash) {
                    staging.insert(OutPoint::new(txn_hash, index as u32), output.clone())?;
                }
            }
        }

        Ok(staging)
    }

    /// Check that `block` would apply cleanly: no transaction listed twice,
    /// coinbase placement, spent outputs available, signatures valid. Does
    /// not mutate.
    pub fn verify_block(&self, block: &Block) -> Result<()> {
        self.stage_update(block, true).map(|_| ())
    }

    /// Consume the outputs `block` spends and add the ones it creates.
    pub fn update(&mut self, block: &Block) -> Result<()> {
        let staging = self.stage_update(block, false)?;
        self.store.atomic_batch_write(staging.ops)?;
        debug!(
            "[sl-03] group {} applied block {} at height {}",
            self.group,
            hash_prefix(&block.hash()),
            block.height
        );
        Ok(())
    }

    /// Exact inverse of [`UtxoSet::update`]. Spent outputs are restored from
    /// the inputs' cached value and key, never from the chain.
    pub fn reverse(&mut self, block: &Block) -> Result<()> {
        let mut staging = Staging::default();

        for txn in block.txns.iter().rev() {
            let txn_hash = txn.hash();

            for (index, output) in txn.vout.iter().enumerate() {
                if !self.tracks(&output.pub_key_hash) {
                    continue;
                }
                let outpoint = OutPoint::new(txn_hash, index as u32);
                let created = self
                    .staged(&staging, &outpoint)?
                    .ok_or(UtxoError::MissingCreatedOutput(outpoint))?;
                staging.remove(outpoint, &created);
            }

            for input in &txn.vin {
                let Some(outpoint) = input.outpoint() else {
                    continue;
                };
                let restored = input.spent_output();
                if self.tracks(&restored.pub_key_hash) {
                    staging.insert(outpoint, restored)?;
                }
            }
        }

        self.store.atomic_batch_write(staging.ops)?;
        debug!(
            "[sl-03] group {} reversed block {} at height {}",
            self.group,
            hash_prefix(&block.hash()),
            block.height
        );
        Ok(())
    }

    /// Rebuild from the active chain. Caller must hold exclusive access for
    /// the whole rebuild.
    pub fn reindex<C: KeyValueStore>(&mut self, chain: &ChainStore<C>) -> Result<()> {
        self.store.clear()?;
        let Some(height) = chain.height()? else {
            return Ok(());
        };
        for block in chain.blocks_in_range(0, height)? {
            self.update(&block)?;
        }
        info!(
            "[sl-03] group {} reindexed {} blocks, {} unspent outputs",
            self.group,
            height + 1,
            self.len()?
        );
        Ok(())
    }

    pub(crate) fn spendable<F>(
        &self,
        owner: &PubKeyHash,
        is_claimed: F,
    ) -> Result<Vec<(OutPoint, TxnOutput)>>
    where
        F: Fn(&OutPoint) -> bool,
    {
        Ok(self
            .find_utxo_by_hash(owner)?
            .into_iter()
            .filter(|(outpoint, _)| !is_claimed(outpoint))
            .collect())
    }
}
