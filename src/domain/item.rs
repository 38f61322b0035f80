use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type ItemId = Uuid;

/// Represents a positive monetary amount carried by an item.
///
/// This is a wrapper around `rust_decimal::Decimal` that can only be built from a
/// strictly positive value, so an `Item` never holds a zero or negative amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Lifecycle states of an item. `InProgress` is parameterised by
/// [`Item::current_stage`].
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemState {
    Created,
    Transacting,
    InProgress,
    Completed,
    Error,
    RefundPending,
    Refunded,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Transacting => "TRANSACTING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Error => "ERROR",
            Self::RefundPending => "REFUND_PENDING",
            Self::Refunded => "REFUNDED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Refunded)
    }

    /// States in which the pipeline is actively held by the item.
    pub fn is_pipeline(&self) -> bool {
        matches!(self, Self::Transacting | Self::InProgress)
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse summary of an item relative to its transaction.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ItemPhase {
    /// First-time processing.
    Processing,
    /// Any unfinished correction after an error.
    Correcting,
    Error,
    /// Positive finish state.
    Resolved,
}

/// A payment moving through the processing pipeline.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Item {
    pub id: ItemId,
    pub amount: Amount,
    pub state: ItemState,
    /// Index into the pipeline, meaningful while the item is transacting or in progress.
    pub current_stage: u32,
    /// Stage at which processing failed. Only set while `state == Error`.
    pub error_stage: Option<u32>,
    /// Whether processing of this item has ever errored.
    pub has_errored: bool,
    /// Optimistic concurrency token, bumped by exactly one per transition.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn new(amount: Amount) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            amount,
            state: ItemState::Created,
            current_stage: 0,
            error_stage: None,
            has_errored: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// State name with the stage index appended for in-progress items, e.g. `IN_PROGRESS[1]`.
    pub fn state_label(&self) -> String {
        match self.state {
            ItemState::InProgress => format!("IN_PROGRESS[{}]", self.current_stage),
            other => other.as_str().to_string(),
        }
    }

    pub fn phase(&self) -> ItemPhase {
        match self.state {
            ItemState::Completed | ItemState::Refunded => ItemPhase::Resolved,
            ItemState::Error => ItemPhase::Error,
            ItemState::RefundPending => ItemPhase::Correcting,
            ItemState::Created | ItemState::Transacting | ItemState::InProgress => {
                if self.has_errored {
                    ItemPhase::Correcting
                } else {
                    ItemPhase::Processing
                }
            }
        }
    }
}
