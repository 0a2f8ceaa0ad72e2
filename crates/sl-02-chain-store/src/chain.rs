//! # Chain Store
//!
//! One group's chain: blocks by hash, a height index, a transaction index
//! and the tip pointer. Every mutation is a single atomic batch.
//!
//! Blocks above the tip stay readable by hash after [`ChainStore::set_tip`]
//! moves the pointer down; they are *detached* until either removed with
//! [`ChainStore::remove_detached`] or reattached by moving the tip back.

use crate::domain::keys::{block_key, height_key, txn_key, TIP_KEY};
use crate::domain::ChainStoreError;
use crate::ports::{BatchOperation, KeyValueStore};
use shared_types::{hash_prefix, Block, Hash, ZERO_HASH};
use tracing::debug;

type Result<T> = std::result::Result<T, ChainStoreError>;

/// Block ledger of one group.
pub struct ChainStore<S: KeyValueStore> {
    store: S,
}

fn decode_hash(bytes: &[u8], what: &str) -> Result<Hash> {
    <Hash>::try_from(bytes)
        .map_err(|_| ChainStoreError::Corrupt(format!("{what} is {} bytes", bytes.len())))
}

impl<S: KeyValueStore> ChainStore<S> {
    /// Wrap a byte store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying byte store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Any stored block, active or detached.
    pub fn block_by_hash(&self, hash: &Hash) -> Result<Option<Block>> {
        match self.store.get(&block_key(hash))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Hash of the tip, `None` for an empty chain.
    pub fn tip_hash(&self) -> Result<Option<Hash>> {
        self.store
            .get(TIP_KEY)?
            .map(|bytes| decode_hash(&bytes, "tip pointer"))
            .transpose()
    }

    /// The tip block.
    pub fn tip(&self) -> Result<Option<Block>> {
        let Some(hash) = self.tip_hash()? else {
            return Ok(None);
        };
        self.block_by_hash(&hash)?
            .map(Some)
            .ok_or_else(|| ChainStoreError::Corrupt(format!("tip {} missing", hash_prefix(&hash))))
    }

    /// Tip height, `None` for an empty chain.
    pub fn height(&self) -> Result<Option<u32>> {
        Ok(self.tip()?.map(|tip| tip.height))
    }

    /// Hash of the active block at `height`.
    pub fn hash_at(&self, height: u32) -> Result<Option<Hash>> {
        match self.height()? {
            Some(tip_height) if height <= tip_height => self.indexed_hash(height),
            _ => Ok(None),
        }
    }

    fn indexed_hash(&self, height: u32) -> Result<Option<Hash>> {
        self.store
            .get(&height_key(height))?
            .map(|bytes| decode_hash(&bytes, "height index entry"))
            .transpose()
    }

    /// Active block at `height`.
    pub fn block_by_height(&self, height: u32) -> Result<Option<Block>> {
        let Some(hash) = self.hash_at(height)? else {
            return Ok(None);
        };
        self.block_by_hash(&hash)?.map(Some).ok_or_else(|| {
            ChainStoreError::Corrupt(format!("height {height} indexes missing block"))
        })
    }

    /// The genesis block.
    pub fn genesis(&self) -> Result<Option<Block>> {
        self.block_by_height(0)
    }

    /// Whether `hash` is on the active chain.
    pub fn is_active(&self, hash: &Hash) -> Result<bool> {
        let Some(block) = self.block_by_hash(hash)? else {
            return Ok(false);
        };
        Ok(self.hash_at(block.height)? == Some(*hash))
    }

    /// Active block that includes the transaction.
    pub fn txn_block(&self, txn_hash: &Hash) -> Result<Option<Block>> {
        let Some(bytes) = self.store.get(&txn_key(txn_hash))? else {
            return Ok(None);
        };
        let block_hash = decode_hash(&bytes, "txn index entry")?;
        if !self.is_active(&block_hash)? {
            return Ok(None);
        }
        self.block_by_hash(&block_hash)
    }

    /// Whether the active chain includes the transaction.
    pub fn contains_txn(&self, txn_hash: &Hash) -> Result<bool> {
        Ok(self.txn_block(txn_hash)?.is_some())
    }

    /// Active blocks `from..=to`, clipped to the tip.
    pub fn blocks_in_range(&self, from: u32, to: u32) -> Result<Vec<Block>> {
        let Some(tip_height) = self.height()? else {
            return Ok(Vec::new());
        };
        let to = to.min(tip_height);
        if from > to {
            return Ok(Vec::new());
        }

        let mut blocks = Vec::with_capacity((to - from + 1) as usize);
        for height in from..=to {
            match self.block_by_height(height)? {
                Some(block) => blocks.push(block),
                None => break,
            }
        }
        Ok(blocks)
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Append a block on top of the tip (or as genesis of an empty chain).
    pub fn append(&mut self, block: &Block) -> Result<()> {
        match self.tip()? {
            None => {
                if !block.is_genesis() || block.prev_hash != ZERO_HASH {
                    return Err(ChainStoreError::BadGenesis(block.height));
                }
            }
            Some(tip) => {
                if block.is_genesis() {
                    return Err(ChainStoreError::BadGenesis(0));
                }
                if block.height != tip.height + 1 || block.prev_hash != tip.hash() {
                    return Err(ChainStoreError::DoesNotChain {
                        height: block.height,
                        expected_height: tip.height + 1,
                    });
                }
            }
        }

        let hash = block.hash();
        let mut ops = vec![
            BatchOperation::put(block_key(&hash), bincode::serialize(block)?),
            BatchOperation::put(height_key(block.height), hash.to_vec()),
            BatchOperation::put(TIP_KEY.to_vec(), hash.to_vec()),
        ];
        for txn in &block.txns {
            ops.push(BatchOperation::put(txn_key(&txn.hash()), hash.to_vec()));
        }
        self.store.atomic_batch_write(ops)?;

        debug!(
            "[sl-02] appended block {} at height {} (group {})",
            hash_prefix(&hash),
            block.height,
            block.group
        );
        Ok(())
    }

    /// Move the tip pointer to a stored block. Blocks above it become
    /// detached; moving the pointer back up reattaches them.
    pub fn set_tip(&mut self, hash: &Hash) -> Result<()> {
        let block = self
            .block_by_hash(hash)?
            .ok_or(ChainStoreError::UnknownBlock(*hash))?;
        if self.indexed_hash(block.height)? != Some(*hash) {
            return Err(ChainStoreError::Corrupt(format!(
                "block {} is not indexed at height {}",
                hash_prefix(hash),
                block.height
            )));
        }
        self.store.put(TIP_KEY, hash)?;
        debug!("[sl-02] tip set to {} at height {}", hash_prefix(hash), block.height);
        Ok(())
    }

    /// Remove the tip block and move the pointer to its parent.
    pub fn delete_tip(&mut self) -> Result<Block> {
        let tip = self.tip()?.ok_or(ChainStoreError::Empty)?;
        let hash = tip.hash();

        let mut ops = self.removal_ops(&tip, &hash)?;
        if tip.is_genesis() {
            ops.push(BatchOperation::delete(TIP_KEY.to_vec()));
        } else {
            ops.push(BatchOperation::put(TIP_KEY.to_vec(), tip.prev_hash.to_vec()));
        }
        self.store.atomic_batch_write(ops)?;
        Ok(tip)
    }

    /// Remove a block that sits above the tip.
    pub fn remove_detached(&mut self, hash: &Hash) -> Result<Block> {
        if self.is_active(hash)? {
            return Err(ChainStoreError::InActiveChain(*hash));
        }
        let block = self
            .block_by_hash(hash)?
            .ok_or(ChainStoreError::UnknownBlock(*hash))?;
        let ops = self.removal_ops(&block, hash)?;
        self.store.atomic_batch_write(ops)?;
        Ok(block)
    }

    /// Delete the block record plus any index entries that still point at it.
    fn removal_ops(&self, block: &Block, hash: &Hash) -> Result<Vec<BatchOperation>> {
        let mut ops = vec![BatchOperation::delete(block_key(hash))];
        if self.indexed_hash(block.height)? == Some(*hash) {
            ops.push(BatchOperation::delete(height_key(block.height)));
        }
        for txn in &block.txns {
            let key = txn_key(&txn.hash());
            if self.store.get(&key)?.as_deref() == Some(hash.as_slice()) {
                ops.push(BatchOperation::delete(key));
            }
        }
        Ok(ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::InMemoryKVStore;
    use shared_types::Transaction;

    fn genesis() -> Block {
        Block {
            txns: vec![Transaction::coinbase([1u8; 20], 10, 0, 0)],
            ..Block::default()
        }
    }

    fn child(parent: &Block, tag: u64) -> Block {
        Block {
            group: parent.group,
            height: parent.height + 1,
            prev_hash: parent.hash(),
            nonce: tag,
            txns: vec![Transaction::coinbase([tag as u8; 20], 10, 0, parent.height + 1)],
            ..Block::default()
        }
    }

    fn chain_of(len: u32) -> (ChainStore<InMemoryKVStore>, Vec<Block>) {
        let mut chain = ChainStore::new(InMemoryKVStore::new());
        let mut blocks = vec![genesis()];
        chain.append(&blocks[0]).unwrap();
        for _ in 1..len {
            let next = child(blocks.last().unwrap(), 1);
            chain.append(&next).unwrap();
            blocks.push(next);
        }
        (chain, blocks)
    }

    #[test]
    fn test_empty_chain() {
        let chain = ChainStore::new(InMemoryKVStore::new());
        assert_eq!(chain.height().unwrap(), None);
        assert!(chain.genesis().unwrap().is_none());
        assert!(chain.blocks_in_range(0, 5).unwrap().is_empty());
    }

    #[test]
    fn test_append_and_read() {
        let (chain, blocks) = chain_of(3);

        assert_eq!(chain.height().unwrap(), Some(2));
        assert_eq!(chain.genesis().unwrap(), Some(blocks[0].clone()));
        assert_eq!(chain.hash_at(1).unwrap(), Some(blocks[1].hash()));
        assert_eq!(chain.block_by_height(2).unwrap(), Some(blocks[2].clone()));
        assert_eq!(chain.hash_at(3).unwrap(), None);
        assert_eq!(chain.blocks_in_range(1, 9).unwrap(), blocks[1..].to_vec());
    }

    #[test]
    fn test_append_rejects_non_chaining_blocks() {
        let (mut chain, blocks) = chain_of(2);

        let gap = Block {
            height: 5,
            prev_hash: blocks[1].hash(),
            ..Block::default()
        };
        assert!(matches!(
            chain.append(&gap),
            Err(ChainStoreError::DoesNotChain { height: 5, expected_height: 2 })
        ));

        let fork = child(&blocks[0], 9);
        assert!(matches!(chain.append(&fork), Err(ChainStoreError::DoesNotChain { .. })));
        assert!(matches!(chain.append(&genesis()), Err(ChainStoreError::BadGenesis(0))));

        let mut empty = ChainStore::new(InMemoryKVStore::new());
        assert!(matches!(empty.append(&blocks[1]), Err(ChainStoreError::BadGenesis(1))));
    }

    #[test]
    fn test_txn_index() {
        let (chain, blocks) = chain_of(2);
        let coinbase = &blocks[1].txns[0];

        assert!(chain.contains_txn(&coinbase.hash()).unwrap());
        assert_eq!(chain.txn_block(&coinbase.hash()).unwrap(), Some(blocks[1].clone()));
    }

    #[test]
    fn test_delete_tip() {
        let (mut chain, blocks) = chain_of(3);
        let removed = chain.delete_tip().unwrap();

        assert_eq!(removed, blocks[2]);
        assert_eq!(chain.height().unwrap(), Some(1));
        assert!(!chain.contains_txn(&blocks[2].txns[0].hash()).unwrap());
        assert!(chain.block_by_hash(&blocks[2].hash()).unwrap().is_none());

        chain.delete_tip().unwrap();
        chain.delete_tip().unwrap();
        assert_eq!(chain.height().unwrap(), None);
        assert!(matches!(chain.delete_tip(), Err(ChainStoreError::Empty)));
    }

    #[test]
    fn test_set_tip_detaches_and_restores() {
        let (mut chain, blocks) = chain_of(4);
        let origin = blocks[3].hash();

        chain.set_tip(&blocks[1].hash()).unwrap();
        assert_eq!(chain.height().unwrap(), Some(1));
        assert_eq!(chain.hash_at(2).unwrap(), None);
        assert!(!chain.contains_txn(&blocks[3].txns[0].hash()).unwrap());
        assert!(chain.block_by_hash(&origin).unwrap().is_some());

        chain.set_tip(&origin).unwrap();
        assert_eq!(chain.height().unwrap(), Some(3));
        assert!(chain.contains_txn(&blocks[3].txns[0].hash()).unwrap());
    }

    #[test]
    fn test_remove_detached_then_replay_fork() {
        let (mut chain, blocks) = chain_of(4);
        chain.set_tip(&blocks[1].hash()).unwrap();

        assert!(matches!(
            chain.remove_detached(&blocks[1].hash()),
            Err(ChainStoreError::InActiveChain(_))
        ));
        chain.remove_detached(&blocks[3].hash()).unwrap();
        chain.remove_detached(&blocks[2].hash()).unwrap();

        let fork = child(&blocks[1], 7);
        chain.append(&fork).unwrap();
        assert_eq!(chain.hash_at(2).unwrap(), Some(fork.hash()));
        assert!(matches!(
            chain.set_tip(&blocks[3].hash()),
            Err(ChainStoreError::UnknownBlock(_))
        ));
    }

    #[test]
    fn test_set_tip_unknown_block() {
        let (mut chain, _) = chain_of(1);
        assert!(matches!(
            chain.set_tip(&[9u8; 32]),
            Err(ChainStoreError::UnknownBlock(_))
        ));
    }
}
