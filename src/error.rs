use crate::domain::action::{Action, ActorRole};
use crate::domain::item::{Item, ItemId, ItemState};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Illegal transition: cannot {action} an item in state {state}")]
    IllegalTransition { state: ItemState, action: Action },
    #[error("Pipeline exhausted: item is already {state}")]
    PipelineExhausted { state: ItemState },
    #[error("Transaction already exists for item {0}")]
    TransactionAlreadyExists(ItemId),
    #[error("Concurrent modification of item {item} after {attempts} attempts")]
    ConcurrentModification { item: ItemId, attempts: u32 },
    #[error("Unauthorized: {action} requires administrator, actor is {role}")]
    Unauthorized { action: Action, role: ActorRole },
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),
    #[error("Timed out after {after:?} applying action to item {item}")]
    Timeout { item: ItemId, after: Duration },
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDBError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

/// Flat classification of [`LedgerError`] handed to the request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    IllegalTransition,
    PipelineExhausted,
    TransactionAlreadyExists,
    ConcurrentModification,
    Unauthorized,
    NotFound,
    Timeout,
    Validation,
    Internal,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IllegalTransition { .. } => ErrorKind::IllegalTransition,
            Self::PipelineExhausted { .. } => ErrorKind::PipelineExhausted,
            Self::TransactionAlreadyExists(_) => ErrorKind::TransactionAlreadyExists,
            Self::ConcurrentModification { .. } => ErrorKind::ConcurrentModification,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::ItemNotFound(_) => ErrorKind::NotFound,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ValidationError(_) => ErrorKind::Validation,
            _ => ErrorKind::Internal,
        }
    }

    /// Only write conflicts are worth another attempt; everything else is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }

    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(Box::new(std::io::Error::other(msg.into())))
    }
}

/// A refused action together with the item as it stands after the refusal.
///
/// `item` is `None` only when the item could not be loaded at all.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct Rejection {
    #[source]
    pub error: LedgerError,
    pub item: Option<Item>,
}

impl Rejection {
    pub fn new(error: LedgerError, item: Option<Item>) -> Self {
        Self { error, item }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn current_state(&self) -> Option<ItemState> {
        self.item.as_ref().map(|item| item.state)
    }
}

impl From<LedgerError> for Rejection {
    fn from(error: LedgerError) -> Self {
        Self { error, item: None }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
