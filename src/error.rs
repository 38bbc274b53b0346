use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("invalid dataset code: {0}")]
    InvalidDatasetId(String),

    #[error("invalid period label: {0}")]
    InvalidPeriod(String),

    #[error("cache directory does not exist: {0}")]
    CacheDirMissing(Utf8PathBuf),

    #[error("dataset not found on bulk service: {0}")]
    DatasetNotFound(String),

    #[error("bulk request failed: {0}")]
    Http(String),

    #[error("bulk service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed bulk file: {0}")]
    MalformedBulk(String),

    #[error("mixed time frequencies ({0}); pass select_time or use the raw time format")]
    MixedFrequencies(String),

    #[error("no cache entry at {0}")]
    CacheMiss(Utf8PathBuf),

    #[error("unreadable cache entry at {path}: {message}")]
    CacheCorrupt { path: Utf8PathBuf, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
