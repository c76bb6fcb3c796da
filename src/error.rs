//! Error types for fogmap.

use thiserror::Error;

/// Errors produced by the visited-area cache and its storage backends.
#[derive(Debug, Error)]
pub enum FogmapError {
    /// The persistent store could not be read during warm-up.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A batch could not be written; nothing from the batch is considered persisted.
    #[error("storage write failed: {0}")]
    StorageWriteFailed(String),

    /// Viewport corners are not usable as a rectangle.
    #[error("invalid viewport bound")]
    InvalidBound,

    /// The cache was destroyed and must be rebuilt before use.
    #[error("cache has been destroyed")]
    CacheDestroyed,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid file format")]
    InvalidFormat,

    #[error("unexpected end of file")]
    UnexpectedEof,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FogmapError {
    /// Wraps any failure raised while writing a batch.
    pub(crate) fn write_failed(err: impl std::fmt::Display) -> Self {
        FogmapError::StorageWriteFailed(err.to_string())
    }

    /// Wraps any failure raised while loading the persisted set.
    pub(crate) fn unavailable(err: impl std::fmt::Display) -> Self {
        FogmapError::StorageUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FogmapError>;
