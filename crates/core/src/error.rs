use thiserror::Error;

use crate::model::{CategoryError, PackError, QuestionError};

/// Validation failures raised by the domain model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Pack(#[from] PackError),
    #[error(transparent)]
    Category(#[from] CategoryError),
}
