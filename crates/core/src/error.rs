use thiserror::Error;

use crate::model::CompletionError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Completion(#[from] CompletionError),
}
