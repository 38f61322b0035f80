use super::action::{Action, Actor};
use super::item::{Item, ItemId, ItemState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One applied transition. Append-only.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct AuditEntry {
    pub item_id: ItemId,
    pub from_state: ItemState,
    pub from_stage: u32,
    pub to_state: ItemState,
    pub to_stage: u32,
    pub action: Action,
    pub actor: Actor,
    /// Item version produced by this transition; orders entries per item.
    pub version: u64,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn record(before: &Item, after: &Item, action: Action, actor: &Actor) -> Self {
        Self {
            item_id: after.id,
            from_state: before.state,
            from_stage: before.current_stage,
            to_state: after.state,
            to_stage: after.current_stage,
            action,
            actor: actor.clone(),
            version: after.version,
            timestamp: after.updated_at,
        }
    }
}
