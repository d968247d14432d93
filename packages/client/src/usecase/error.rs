//! UseCase layer error definitions.

use thiserror::Error;

use crate::domain::RepositoryError;

/// Errors raised while reconciling a server update
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The history store rejected an operation
    #[error("Failed to update game history: {0}")]
    Repository(#[from] RepositoryError),
}
