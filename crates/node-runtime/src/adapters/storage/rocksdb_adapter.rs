//! # RocksDB Storage Adapter
//!
//! Production RocksDB implementation of the [`KeyValueStore`] port.
//!
//! One database per node. Every [`StoreScope`] (`chain-N`, `utxo-N`,
//! `heads`) lives in its own column family, so the tables of different
//! groups never share a key space.
//!
//! Tuned the usual way for append-heavy workloads: Snappy compression,
//! bloom filters, LRU block cache, optional fsync per write.

use parking_lot::RwLock;
use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamily, ColumnFamilyDescriptor, DBCompressionType, Direction,
    IteratorMode, Options, WriteBatch, WriteOptions, DB,
};
use sl_02_chain_store::{BatchOperation, KVStoreError, KeyValueStore};
use sl_06_chain_sync::StoreScope;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// RocksDB tuning.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Database directory.
    pub path: PathBuf,
    /// Block cache size in bytes (default: 64MB).
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB).
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 3).
    pub max_write_buffer_number: i32,
    /// fsync after each write.
    pub sync_writes: bool,
}

impl RocksDbConfig {
    /// Durable defaults at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            max_write_buffer_number: 3,
            sync_writes: true,
        }
    }

    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            max_write_buffer_number: 2,
            sync_writes: false,
        }
    }
}

fn io_error(action: &str, err: rocksdb::Error) -> KVStoreError {
    KVStoreError::IOError {
        message: format!("RocksDB {} failed: {}", action, err),
    }
}

/// One node's database.
pub struct RocksDbDatabase {
    db: Arc<RwLock<DB>>,
    sync_writes: bool,
}

impl RocksDbDatabase {
    /// Open or create the database with a column family per scope.
    /// Column families already on disk are reopened too.
    pub fn open(config: &RocksDbConfig, scopes: &[StoreScope]) -> Result<Self, KVStoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_compression_type(DBCompressionType::Snappy);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let mut families: BTreeSet<String> = scopes.iter().map(ToString::to_string).collect();
        if let Ok(existing) = DB::list_cf(&opts, &config.path) {
            families.extend(existing.into_iter().filter(|name| name != "default"));
        }
        let descriptors: Vec<ColumnFamilyDescriptor> = families
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, descriptors)
            .map_err(|err| io_error("open", err))?;
        info!(
            "[runtime] opened RocksDB at {} with {} tables",
            config.path.display(),
            families.len()
        );

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            sync_writes: config.sync_writes,
        })
    }

    /// Store for one scope.
    pub fn store(&self, scope: StoreScope) -> Result<RocksDbStore, KVStoreError> {
        let cf = scope.to_string();
        if self.db.read().cf_handle(&cf).is_none() {
            return Err(KVStoreError::CorruptionError {
                message: format!("missing column family {}", cf),
            });
        }
        Ok(RocksDbStore {
            db: Arc::clone(&self.db),
            cf,
            sync_writes: self.sync_writes,
        })
    }
}

/// One column family of a [`RocksDbDatabase`].
pub struct RocksDbStore {
    db: Arc<RwLock<DB>>,
    cf: String,
    sync_writes: bool,
}

impl RocksDbStore {
    fn handle<'a>(&self, db: &'a DB) -> Result<&'a ColumnFamily, KVStoreError> {
        db.cf_handle(&self.cf)
            .ok_or_else(|| KVStoreError::CorruptionError {
                message: format!("missing column family {}", self.cf),
            })
    }

    fn write_opts(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        write_opts
    }

    fn write_batch(&self, db: &DB, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let cf = self.handle(db)?;
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put_cf(cf, &key, &value),
                BatchOperation::Delete { key } => batch.delete_cf(cf, &key),
            }
        }
        db.write_opt(batch, &self.write_opts())
            .map_err(|err| io_error("batch write", err))
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        let db = self.db.read();
        let cf = self.handle(&db)?;
        db.get_cf(cf, key).map_err(|err| io_error("get", err))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        let db = self.db.write();
        let cf = self.handle(&db)?;
        db.put_cf_opt(cf, key, value, &self.write_opts())
            .map_err(|err| io_error("put", err))
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        let db = self.db.write();
        let cf = self.handle(&db)?;
        db.delete_cf_opt(cf, key, &self.write_opts())
            .map_err(|err| io_error("delete", err))
    }

    fn clear(&mut self) -> Result<(), KVStoreError> {
        let db = self.db.write();
        let keys = {
            let cf = self.handle(&db)?;
            let mut keys = Vec::new();
            for item in db.iterator_cf(cf, IteratorMode::Start) {
                let (key, _) = item.map_err(|err| io_error("scan", err))?;
                keys.push(BatchOperation::delete(key.to_vec()));
            }
            keys
        };
        self.write_batch(&db, keys)
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let db = self.db.write();
        self.write_batch(&db, operations)
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        let db = self.db.read();
        let cf = self.handle(&db)?;
        db.get_pinned_cf(cf, key)
            .map(|value| value.is_some())
            .map_err(|err| io_error("exists check", err))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KVStoreError> {
        let db = self.db.read();
        let cf = self.handle(&db)?;
        let mut results = Vec::new();
        for item in db.iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = item.map_err(|err| io_error("scan", err))?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }
}
