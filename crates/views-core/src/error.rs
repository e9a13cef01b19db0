use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by wikiviews.
#[derive(Error, Debug)]
pub enum ViewsError {
    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The remote service answered with a non-success status code.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// The response body was missing a field or had the wrong shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// An edit timestamp did not match `%Y-%m-%dT%H:%M:%SZ`.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be created, written or appended to.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Chart rendering failed.
    #[error("Chart error: {0}")]
    Chart(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the wikiviews crates.
pub type Result<T> = std::result::Result<T, ViewsError>;
