//! Error taxonomy for plant store operations.
//!
//! Adapter failures are wrapped, never retried: every storage problem
//! (unreadable backend, malformed JSON) surfaces as
//! [`StoreError::Persistence`] and every scheduler problem as
//! [`StoreError::Scheduling`].

use crate::features::reminders::SchedulerError;
use crate::features::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("persistence failure: {0}")]
    Persistence(#[from] StorageError),
    #[error("scheduling failure: {0}")]
    Scheduling(#[from] SchedulerError),
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("no saved plant with id '{id}'")]
    NotFound { id: String },
}

impl StoreError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, StoreError::Persistence(_))
    }

    pub fn is_scheduling(&self) -> bool {
        matches!(self, StoreError::Scheduling(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
