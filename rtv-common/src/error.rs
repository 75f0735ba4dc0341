//! Common error types for RTV

use thiserror::Error;

/// Common result type for RTV operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the load pipeline and the query engine
///
/// Load-side errors (`Acquisition`, `Decompression`, `Parse`) are terminal:
/// a failed load leaves no usable store behind. Query-side errors
/// (`StoreNotReady`, `NodeNotFound`) are recoverable and the caller may
/// retry once the store exists.
#[derive(Error, Debug)]
pub enum Error {
    /// Network or cache failure while acquiring the payload
    #[error("Acquisition error: {0}")]
    Acquisition(String),

    /// Payload cache database error (wraps sqlx::Error)
    #[error("Cache error: {0}")]
    Cache(#[from] sqlx::Error),

    /// Corrupt or truncated compressed payload
    #[error("Decompression error: {0}")]
    Decompression(String),

    /// Malformed JSON after decompression (wraps serde_json::Error)
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Query issued before a tree was successfully loaded
    #[error("Tree not loaded yet. Please fetch the tree first.")]
    StoreNotReady,

    /// Query referenced an id absent from the store
    #[error("Node with id {0} not found.")]
    NodeNotFound(u64),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
