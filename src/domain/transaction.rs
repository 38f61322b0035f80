use super::item::ItemId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The monetary record bound to an item. Written once, never mutated.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub item_id: ItemId,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(item_id: ItemId) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            created_at: Utc::now(),
        }
    }
}
