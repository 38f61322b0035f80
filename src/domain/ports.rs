use super::audit::AuditEntry;
use super::item::{Item, ItemId};
use super::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;

/// A conditioned write: swap in `item` only if the stored version still equals
/// `expected_version`, appending `audit` and inserting `transaction` in the same unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub expected_version: u64,
    pub item: Item,
    pub audit: AuditEntry,
    pub transaction: Option<Transaction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The stored version moved on since it was read; nothing was written.
    Conflict,
    /// A transaction is already bound to the item; nothing was written.
    TransactionExists,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_item(&self, item: Item) -> Result<()>;
    async fn load_item(&self, id: ItemId) -> Result<Option<Item>>;
    async fn all_items(&self) -> Result<Vec<Item>>;
    async fn commit(&self, commit: Commit) -> Result<CommitOutcome>;
    async fn transaction_for(&self, item_id: ItemId) -> Result<Option<Transaction>>;
    /// Audit entries for one item, oldest first.
    async fn audit_log(&self, item_id: ItemId) -> Result<Vec<AuditEntry>>;
}

pub type LedgerStoreBox = Box<dyn LedgerStore>;
