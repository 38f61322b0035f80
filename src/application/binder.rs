use crate::domain::item::ItemId;
use crate::domain::ports::LedgerStore;
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};

/// Prepares the single transaction record an item may carry.
///
/// The binder only checks and builds; the lifecycle service commits the record
/// in the same unit as the `CREATED -> TRANSACTING` swap.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionBinder;

impl TransactionBinder {
    pub fn new() -> Self {
        Self
    }

    pub async fn prepare(&self, store: &dyn LedgerStore, item_id: ItemId) -> Result<Transaction> {
        if store.transaction_for(item_id).await?.is_some() {
            return Err(LedgerError::TransactionAlreadyExists(item_id));
        }
        Ok(Transaction::new(item_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action::{Action, Actor};
    use crate::domain::audit::AuditEntry;
    use crate::domain::item::{Amount, Item, ItemState};
    use crate::domain::ports::Commit;
    use crate::infrastructure::in_memory::InMemoryLedgerStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_prepare_refuses_bound_item() {
        let store = InMemoryLedgerStore::new();
        let binder = TransactionBinder::new();
        let item = Item::new(Amount::new(dec!(10)).unwrap());
        store.insert_item(item.clone()).await.unwrap();

        let tx = binder.prepare(&store, item.id).await.unwrap();
        assert_eq!(tx.item_id, item.id);

        let mut after = item.clone();
        after.state = ItemState::Transacting;
        after.version = 1;
        store
            .commit(Commit {
                expected_version: 0,
                audit: AuditEntry::record(
                    &item,
                    &after,
                    Action::CreateTransaction,
                    &Actor::operator("t"),
                ),
                transaction: Some(tx),
                item: after,
            })
            .await
            .unwrap();

        assert!(matches!(
            binder.prepare(&store, item.id).await,
            Err(LedgerError::TransactionAlreadyExists(id)) if id == item.id
        ));
    }
}
