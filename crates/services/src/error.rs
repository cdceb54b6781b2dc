//! Shared error types for the services crate.
//!
//! Repository-level "nothing found" is translated to the owning service's
//! `NotFound` at this boundary, never silently ignored. Any other storage
//! failure stays wrapped behind a transparent `Storage` variant so callers
//! can tell expected business-rule failures from broken infrastructure
//! without inspecting causes.

use thiserror::Error;

use storage::repository::StorageError;

/// Errors emitted by `SelectionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SelectionError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ReviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewServiceError {
    #[error("question not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `UnitService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UnitServiceError {
    #[error("unit not found")]
    NotFound,
    #[error("unit belongs to another user")]
    Authorization,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
