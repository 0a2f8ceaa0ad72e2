//! # Block-Head Store
//!
//! Header-only blocks of every group, keyed by (group, height). Heads are
//! write-once: the first valid head seen at a height wins.

use crate::domain::keys::{head_group_prefix, head_key};
use crate::domain::ChainStoreError;
use crate::ports::KeyValueStore;
use shared_types::{BlockHead, GroupId};

type Result<T> = std::result::Result<T, ChainStoreError>;

/// Cross-group head index.
pub struct BlockHeadStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> BlockHeadStore<S> {
    /// Wrap a byte store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Head of `group` at `height`.
    pub fn get(&self, group: GroupId, height: u32) -> Result<Option<BlockHead>> {
        match self.store.get(&head_key(group, height))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Whether a head exists at (`group`, `height`).
    pub fn contains(&self, group: GroupId, height: u32) -> Result<bool> {
        Ok(self.store.exists(&head_key(group, height))?)
    }

    /// Store the header of `head` unless one already exists at its height.
    /// Returns whether it was inserted.
    pub fn insert(&mut self, head: &BlockHead) -> Result<bool> {
        let key = head_key(head.group, head.height);
        if self.store.exists(&key)? {
            return Ok(false);
        }
        let header = head.head();
        self.store.put(&key, &bincode::serialize(&header)?)?;
        Ok(true)
    }

    /// Every stored head of `group`, in height order.
    pub fn heads_of(&self, group: GroupId) -> Result<Vec<BlockHead>> {
        self.store
            .prefix_scan(&head_group_prefix(group))?
            .into_iter()
            .map(|(_, bytes)| Ok(bincode::deserialize(&bytes)?))
            .collect()
    }
}
