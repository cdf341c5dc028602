//! Error taxonomy for chat operations.
//!
//! Mutations surface every rule violation as a distinct variant so the UI can
//! present it; queries degrade to empty results instead of returning most of
//! these.

use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ChatError {
    /// No resolvable caller where one is required.
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("not found: {0}")]
    NotFound(String),

    /// Caller lacks the membership, admin right, or ownership the action needs.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ChatError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        ChatError::NotFound(what.into())
    }

    pub(crate) fn forbidden(why: impl Into<String>) -> Self {
        ChatError::Forbidden(why.into())
    }

    pub(crate) fn invalid(why: impl Into<String>) -> Self {
        ChatError::InvalidOperation(why.into())
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
