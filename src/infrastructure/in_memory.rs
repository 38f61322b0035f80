use crate::domain::audit::AuditEntry;
use crate::domain::item::{Item, ItemId};
use crate::domain::ports::{Commit, CommitOutcome, LedgerStore};
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    items: HashMap<ItemId, Item>,
    // Creation order, so listings are stable.
    order: Vec<ItemId>,
    transactions: HashMap<ItemId, Transaction>,
    audit: HashMap<ItemId, Vec<AuditEntry>>,
}

/// A thread-safe in-memory ledger.
///
/// Items, transactions and audit entries live behind a single
/// `Arc<RwLock<..>>`, so a commit checks the version and applies every record
/// while holding one write guard. Ideal for tests and for batch runs where
/// persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_item(&self, item: Item) -> Result<()> {
        let mut state = self.state.write().await;
        if state.items.contains_key(&item.id) {
            return Err(LedgerError::ValidationError(format!(
                "Item {} already exists",
                item.id
            )));
        }
        state.order.push(item.id);
        state.items.insert(item.id, item);
        Ok(())
    }

    async fn load_item(&self, id: ItemId) -> Result<Option<Item>> {
        let state = self.state.read().await;
        Ok(state.items.get(&id).cloned())
    }

    async fn all_items(&self) -> Result<Vec<Item>> {
        let state = self.state.read().await;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.items.get(id).cloned())
            .collect())
    }

    async fn commit(&self, commit: Commit) -> Result<CommitOutcome> {
        let mut state = self.state.write().await;
        let id = commit.item.id;

        let current = state
            .items
            .get(&id)
            .ok_or(LedgerError::ItemNotFound(id))?;
        if current.version != commit.expected_version {
            return Ok(CommitOutcome::Conflict);
        }
        if commit.transaction.is_some() && state.transactions.contains_key(&id) {
            return Ok(CommitOutcome::TransactionExists);
        }

        if let Some(tx) = commit.transaction {
            state.transactions.insert(id, tx);
        }
        state.audit.entry(id).or_default().push(commit.audit);
        state.items.insert(id, commit.item);
        Ok(CommitOutcome::Committed)
    }

    async fn transaction_for(&self, item_id: ItemId) -> Result<Option<Transaction>> {
        let state = self.state.read().await;
        Ok(state.transactions.get(&item_id).cloned())
    }

    async fn audit_log(&self, item_id: ItemId) -> Result<Vec<AuditEntry>> {
        let state = self.state.read().await;
        Ok(state.audit.get(&item_id).cloned().unwrap_or_default())
    }
}
