#![forbid(unsafe_code)]

pub mod bank;
pub mod catalog;
pub mod error;
pub mod selector;
pub mod unlock_service;

pub use bank::{load_question_pool, parse_question_pool};
pub use catalog::{load_catalog, parse_catalog};
pub use error::{BankError, CatalogLoadError, UnlockError};
pub use unlock_service::{
    AnswerOutcome, ItemOverview, LOCKED_MESSAGE, OpenOutcome, QuestionPrompt, UnlockService,
};
