use thiserror::Error;

use crate::model::{CatalogError, QuestionError, QuestionPoolError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Pool(#[from] QuestionPoolError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
