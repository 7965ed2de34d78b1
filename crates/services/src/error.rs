//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::CompletionError;
use identity::IdentityError;

/// Errors emitted by the course orchestration services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}
