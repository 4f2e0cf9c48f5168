use thiserror::Error;

/// Errors that can occur when reading or parsing manifest scripts.
#[derive(Debug, Error)]
pub enum Error {
    /// The script has no `addappid(...)` declaration.
    #[error("no addappid(...) declaration found in script")]
    IdentifierNotFound,

    /// I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for manifest-format operations.
pub type Result<T> = std::result::Result<T, Error>;
