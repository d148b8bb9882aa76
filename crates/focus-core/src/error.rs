//! Domain errors

use std::fmt;
use thiserror::Error;

/// Which backing store produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Durable,
    Fast,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Durable => write!(f, "durable store"),
            StoreKind::Fast => write!(f, "fast store"),
        }
    }
}

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Storage unavailable ({store}): {message}")]
    StorageUnavailable { store: StoreKind, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl HistoryError {
    pub fn durable(message: impl Into<String>) -> Self {
        HistoryError::StorageUnavailable {
            store: StoreKind::Durable,
            message: message.into(),
        }
    }

    pub fn fast(message: impl Into<String>) -> Self {
        HistoryError::StorageUnavailable {
            store: StoreKind::Fast,
            message: message.into(),
        }
    }

    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, HistoryError::StorageUnavailable { .. })
    }
}
