//! PKI error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for PKI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// PKI error variants.
#[derive(Debug, Error)]
pub enum Error {
    /// A required parameter is missing or a configuration value is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The certificate validity window is malformed.
    #[error("invalid validity window: {0}")]
    Validity(String),

    /// PEM or DER data could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The target file exists and overwriting was not requested.
    #[error("file already exists: {}", path.display())]
    FileAlreadyExists {
        /// Path of the existing file.
        path: PathBuf,
    },

    /// The file to read does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The key pair source failed to produce a key pair.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Any other filesystem failure.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wraps an I/O error, mapping `NotFound` to [`Error::FileNotFound`] and
    /// `AlreadyExists` to [`Error::FileAlreadyExists`].
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound { path },
            std::io::ErrorKind::AlreadyExists => Self::FileAlreadyExists { path },
            _ => Self::Io { path, source },
        }
    }
}
