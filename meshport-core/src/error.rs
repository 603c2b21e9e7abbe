//! Error types for meshport

use thiserror::Error;

/// Main error type for meshport operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    /// Build a [`Error::Parse`] from anything printable
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse(message.into())
    }

    /// Build a [`Error::ShapeMismatch`] from anything printable
    pub fn shape(message: impl Into<String>) -> Self {
        Error::ShapeMismatch(message.into())
    }
}

/// Result type alias for meshport operations
pub type Result<T> = std::result::Result<T, Error>;
