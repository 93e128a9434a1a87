//! Error types for riggs-feed.

use thiserror::Error;

/// Common error type for riggs-feed.
#[derive(Error, Debug)]
pub enum FeedError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document is not well-formed XML, or could not be written.
    #[error("XML error: {0}")]
    Xml(String),

    /// The stored document is XML but not an RSS feed.
    ///
    /// The tool never tries to repair such a file.
    #[error("structure error: {0}")]
    Structure(String),

    /// Missing or unusable caller input.
    #[error("usage error: {0}")]
    Usage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for riggs-feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;
