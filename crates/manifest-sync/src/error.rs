use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while downloading a remote archive.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No response bytes arrived within the configured window.
    #[error("download timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// Connection-level failure (DNS, TLS, reset, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The destination file could not be written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Whether the server reported that no archive exists at the URL.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Http { status: 404, .. })
    }
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum Error {
    /// The script has no `addappid(...)` declaration.
    #[error("identifier not found in script")]
    IdentifierNotFound,

    /// The input script is missing or not readable as UTF-8 text.
    #[error("cannot read script {path}: {reason}")]
    ScriptRead { path: PathBuf, reason: String },

    /// The remote archive could not be downloaded.
    #[error("{0}")]
    Network(#[from] FetchError),

    /// The downloaded file is not a readable zip archive.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// The rewritten script vanished before packaging.
    #[error("rewritten script not found: {0}")]
    MissingScript(PathBuf),

    /// The output archive could not be written.
    #[error("packaging error: {0}")]
    Packaging(String),

    /// The temporary workspace could not be created.
    #[error("workspace error: {0}")]
    Workspace(String),

    /// The repository catalog could not be read or written.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn script_read(path: impl Into<PathBuf>, err: manifest_format::Error) -> Self {
        match err {
            manifest_format::Error::IdentifierNotFound => Error::IdentifierNotFound,
            manifest_format::Error::IoError(io) => Error::ScriptRead {
                path: path.into(),
                reason: io.to_string(),
            },
        }
    }
}

impl From<manifest_format::Error> for Error {
    fn from(err: manifest_format::Error) -> Self {
        match err {
            manifest_format::Error::IdentifierNotFound => Error::IdentifierNotFound,
            manifest_format::Error::IoError(io) => Error::Io(io),
        }
    }
}

/// Conditions reported by a run that do not change its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    /// The downloaded archive had no payload files; the script is packaged
    /// without version changes.
    #[error("no payload files found in the downloaded archive")]
    NoPayloadFound,

    /// An extracted payload disappeared before packaging and was left out.
    #[error("payload vanished before packaging: {0}")]
    PayloadVanished(PathBuf),

    /// The workspace could not be removed.
    #[error("workspace cleanup failed: {0}")]
    CleanupFailed(String),
}

/// Result type for manifest-sync operations.
pub type Result<T> = std::result::Result<T, Error>;
