//! Crate-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::fusion::FusionError;
use crate::snapshot::SnapshotError;

/// Any error surfaced by the buff system.
#[derive(Debug, Error)]
pub enum Error {
    /// Fusion registry or execution error.
    #[error(transparent)]
    Fusion(#[from] FusionError),

    /// Snapshot capture error.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Configuration or declarative data could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for buff system operations.
pub type Result<T> = std::result::Result<T, Error>;
