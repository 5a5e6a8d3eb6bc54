//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{CategoryError, PackError, QuestionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `PackService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PackServiceError {
    #[error(transparent)]
    Validation(#[from] quiz_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid pack document: {0}")]
    Document(#[from] serde_json::Error),
}

impl From<PackError> for PackServiceError {
    fn from(e: PackError) -> Self {
        Self::Validation(e.into())
    }
}

impl From<QuestionError> for PackServiceError {
    fn from(e: QuestionError) -> Self {
        Self::Validation(e.into())
    }
}

/// Errors emitted by `CategoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CategoryServiceError {
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the quiz session runner.
///
/// Guarded no-ops (double submit, advance before reveal, late ticks) are not
/// errors and never show up here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("pack has no questions")]
    EmptyPack,
    #[error("session already started")]
    AlreadyStarted,
    #[error("no async runtime available to drive the countdown")]
    NoRuntime,
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Pack(#[from] PackServiceError),
    #[error(transparent)]
    Validation(#[from] quiz_core::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
}
