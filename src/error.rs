//! Error types for txt2epub operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a conversion run.
///
/// Recoverable conditions (unresolvable image placeholders, mismatched ruby
/// brackets) never surface here; they are logged and left as literal text.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("summary file not found: {}", .path.display())]
    MissingSummary { path: PathBuf },

    #[error("invalid summary: {0}")]
    InvalidSummary(String),

    #[error("unrecognized timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("cannot read image header: {}", .path.display())]
    ImageProbe { path: PathBuf },

    #[error("no chapter files matching {pattern:?} in {}", .dir.display())]
    NoChapters { dir: PathBuf, pattern: String },
}

pub type Result<T> = std::result::Result<T, Error>;
