//! Error types for tidewater.

use thiserror::Error;

/// The main error type for tidewater operations.
#[derive(Error, Debug)]
pub enum TidewaterError {
    /// An asset could not be loaded from disk or decoded.
    #[error("asset '{name}' failed to load: {reason}")]
    AssetLoad { name: String, reason: String },

    /// Asset data was decoded but is not usable.
    #[error("invalid asset data: {0}")]
    InvalidAsset(String),

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Rendering error.
    #[error("render error: {0}")]
    RenderError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for tidewater operations.
pub type Result<T> = std::result::Result<T, TidewaterError>;
