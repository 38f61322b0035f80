use crate::domain::audit::AuditEntry;
use crate::domain::item::{Item, ItemId};
use crate::domain::ports::{Commit, CommitOutcome, LedgerStore};
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing item records.
pub const CF_ITEMS: &str = "items";
/// Column Family for storing bound transactions, keyed by item id.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for the audit log, keyed by item id followed by big-endian version.
pub const CF_AUDIT: &str = "audit";

/// A persistent ledger implementation using RocksDB.
///
/// Items, transactions and audit entries live in separate Column Families.
/// A commit writes all of them in one `WriteBatch`, and commits are serialized
/// through a mutex so the version check and the write cannot interleave.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    commit_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "items", "transactions" and "audit" column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_ITEMS, CF_TRANSACTIONS, CF_AUDIT]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            commit_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LedgerError::internal(format!("{name} column family not found")))
    }

    fn get_json<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| LedgerError::internal(format!("Serialization error: {}", e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| LedgerError::internal(format!("Deserialization error: {}", e)))
}

fn audit_key(item_id: ItemId, version: u64) -> Vec<u8> {
    let mut key = item_id.as_bytes().to_vec();
    key.extend_from_slice(&version.to_be_bytes());
    key
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn insert_item(&self, item: Item) -> Result<()> {
        let _guard = self.commit_lock.lock().await;
        let cf = self.cf(CF_ITEMS)?;
        if self.db.get_pinned_cf(cf, item.id.as_bytes())?.is_some() {
            return Err(LedgerError::ValidationError(format!(
                "Item {} already exists",
                item.id
            )));
        }
        self.db.put_cf(cf, item.id.as_bytes(), encode(&item)?)?;
        Ok(())
    }

    async fn load_item(&self, id: ItemId) -> Result<Option<Item>> {
        self.get_json(CF_ITEMS, id.as_bytes())
    }

    async fn all_items(&self) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        for entry in self.db.iterator_cf(self.cf(CF_ITEMS)?, IteratorMode::Start) {
            let (_key, value) = entry?;
            items.push(decode::<Item>(&value)?);
        }
        // Keys are random UUIDs; present items in creation order like the in-memory store.
        items.sort_by_key(|item| item.created_at);
        Ok(items)
    }

    async fn commit(&self, commit: Commit) -> Result<CommitOutcome> {
        let _guard = self.commit_lock.lock().await;
        let id = commit.item.id;

        let current: Item = self
            .get_json(CF_ITEMS, id.as_bytes())?
            .ok_or(LedgerError::ItemNotFound(id))?;
        if current.version != commit.expected_version {
            return Ok(CommitOutcome::Conflict);
        }

        let cf_transactions = self.cf(CF_TRANSACTIONS)?;
        let mut batch = WriteBatch::default();
        if let Some(tx) = &commit.transaction {
            if self.db.get_pinned_cf(cf_transactions, id.as_bytes())?.is_some() {
                return Ok(CommitOutcome::TransactionExists);
            }
            batch.put_cf(cf_transactions, id.as_bytes(), encode(tx)?);
        }
        batch.put_cf(
            self.cf(CF_AUDIT)?,
            audit_key(id, commit.audit.version),
            encode(&commit.audit)?,
        );
        batch.put_cf(self.cf(CF_ITEMS)?, id.as_bytes(), encode(&commit.item)?);

        self.db.write(batch)?;
        Ok(CommitOutcome::Committed)
    }

    async fn transaction_for(&self, item_id: ItemId) -> Result<Option<Transaction>> {
        self.get_json(CF_TRANSACTIONS, item_id.as_bytes())
    }

    async fn audit_log(&self, item_id: ItemId) -> Result<Vec<AuditEntry>> {
        let prefix = item_id.as_bytes();
        let mode = IteratorMode::From(prefix, Direction::Forward);

        let mut entries = Vec::new();
        for entry in self.db.iterator_cf(self.cf(CF_AUDIT)?, mode) {
            let (key, value) = entry?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push(decode(&value)?);
        }
        Ok(entries)
    }
}
