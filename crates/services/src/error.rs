//! Shared error types for the services crate.

use thiserror::Error;

use stitch_core::NavigationError;
use stitch_core::model::{PatternId, TrackingError, TrackingStatus};
use storage::repository::StorageError;

/// Errors emitted by tracking session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackingServiceError {
    #[error("pattern has no stitches to track")]
    EmptyPattern,
    #[error("session is {status}; resume it before navigating")]
    NotActive { status: TrackingStatus },
    #[error("session tracks pattern {expected}, not {found}")]
    PatternMismatch {
        expected: PatternId,
        found: PatternId,
    },
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Tracking(#[from] TrackingError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
