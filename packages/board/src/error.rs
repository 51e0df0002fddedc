//! Error taxonomy for board operations.

use board_core::{BookingId, JobId, ResourceId, ResourceStatus};
use storage::StorageError;
use thiserror::Error;

/// Errors returned by registry, lifecycle and persistence calls.
///
/// Every domain variant is recoverable: the caller shows a message and the
/// board is left exactly as it was before the call.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{id} cannot go from {from} to {to}")]
    InvalidTransition {
        id: ResourceId,
        from: ResourceStatus,
        to: ResourceStatus,
    },

    #[error("{id} is not available (currently {status})")]
    ResourceUnavailable { id: ResourceId, status: ResourceStatus },

    #[error("{id} is in use (currently {status})")]
    ResourceBusy { id: ResourceId, status: ResourceStatus },

    #[error("job {id} is {status}, not in the required state")]
    JobNotActive { id: JobId, status: &'static str },

    #[error("resource not found: {0}")]
    ResourceNotFound(ResourceId),

    #[error("job not found: {0}")]
    JobNotFound(JobId),

    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl BoardError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        BoardError::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;
