//! # Outbound Ports (Driven Ports)
//!
//! The byte store the chain, head and UTXO stores are layered on.
//!
//! Production: `RocksDbStore` (node-runtime/adapters/storage/rocksdb_adapter.rs)
//! Testing: [`InMemoryKVStore`] (below)

use crate::domain::KVStoreError;
use std::collections::BTreeMap;

/// Abstract interface for key-value database operations.
///
/// One instance holds one table of one group; the runtime namespaces
/// instances so keys never collide across groups.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    /// Delete a key.
    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError>;

    /// Remove every key.
    fn clear(&mut self) -> Result<(), KVStoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch succeed, or NONE are applied.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Key-ordered pairs whose key starts with `prefix`.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError>;
}

/// Boxed stores, so a node can pick its backend at runtime.
impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        (**self).put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        (**self).delete(key)
    }

    fn clear(&mut self) -> Result<(), KVStoreError> {
        (**self).clear()
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        (**self).atomic_batch_write(operations)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        (**self).exists(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        (**self).prefix_scan(prefix)
    }
}

/// Type-erased store.
pub type DynStore = Box<dyn KeyValueStore>;

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put {
        /// Key.
        key: Vec<u8>,
        /// Value.
        value: Vec<u8>,
    },
    /// Delete a key.
    Delete {
        /// Key.
        key: Vec<u8>,
    },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// In-memory key-value store.
///
/// Ordered so prefix scans come back sorted, matching RocksDB iteration.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKVStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.data.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), KVStoreError> {
        self.data.clear();
        Ok(())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        // Callers hold exclusive access, so applying in order is atomic.
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        let results = self
            .data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_kv_store() {
        let mut store = InMemoryKVStore::new();

        store.put(b"key1", b"value1").unwrap();
        store.put(b"key2", b"value2").unwrap();

        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(store.get(b"key3").unwrap(), None);
        assert!(store.exists(b"key1").unwrap());

        store.delete(b"key1").unwrap();
        assert!(!store.exists(b"key1").unwrap());
    }

    #[test]
    fn test_in_memory_kv_batch_write() {
        let mut store = InMemoryKVStore::new();
        store.put(b"c", b"old").unwrap();

        let ops = vec![
            BatchOperation::put(b"a".to_vec(), b"1".to_vec()),
            BatchOperation::put(b"b".to_vec(), b"2".to_vec()),
            BatchOperation::delete(b"c".to_vec()),
        ];
        store.atomic_batch_write(ops).unwrap();

        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.get(b"c").unwrap(), None);
    }

    #[test]
    fn test_prefix_scan_is_ordered() {
        let mut store = InMemoryKVStore::new();

        store.put(b"h\x00\x02", b"two").unwrap();
        store.put(b"h\x00\x01", b"one").unwrap();
        store.put(b"t\x00\x01", b"txn").unwrap();

        let heights = store.prefix_scan(b"h").unwrap();
        assert_eq!(heights.len(), 2);
        assert_eq!(heights[0].1, b"one".to_vec());
        assert_eq!(store.prefix_scan(b"t").unwrap().len(), 1);
    }

    #[test]
    fn test_boxed_store_delegates() {
        let mut store: DynStore = Box::new(InMemoryKVStore::new());
        store.put(b"k", b"v").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.prefix_scan(b"k").unwrap().len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut store = InMemoryKVStore::new();
        store.put(b"a", b"1").unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
    }
}
