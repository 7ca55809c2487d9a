//! Shared error types for the services crate.

use thiserror::Error;

use gate_core::model::{CatalogError, GroupId, ItemKey, QuestionError, QuestionPoolError};
use storage::repository::StorageError;

/// Errors emitted while loading the question bank file.
///
/// All of these are configuration errors: fatal to quiz-taking, reported to
/// the caller once at startup, and never retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("failed to read question bank at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("question bank is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Pool(#[from] QuestionPoolError),
}

/// Errors emitted while loading the content catalog file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogLoadError {
    #[error("failed to read catalog at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Errors emitted by `UnlockService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UnlockError {
    #[error("unknown item {0}")]
    UnknownItem(ItemKey),
    #[error("unknown group {0}")]
    UnknownGroup(GroupId),
    #[error("no question is pending an answer")]
    NoQuestionPending,
    #[error("choice {index} is out of range for {choices} displayed choices")]
    ChoiceOutOfRange { index: usize, choices: usize },
    #[error("no question bank is loaded; quiz-taking is unavailable")]
    QuizUnavailable,
    #[error(transparent)]
    Storage(#[from] StorageError),
}
