//! CLI error types.

use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Certificate, key or configuration failure from the library.
    #[error(transparent)]
    Pki(#[from] scm_pki::Error),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error while writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn cli_error_display_invalid_argument() {
        let err = CliError::InvalidArgument("--out has no file name".into());
        assert_eq!(err.to_string(), "invalid argument: --out has no file name");
    }

    #[test]
    fn cli_error_wraps_library_error() {
        let err = CliError::from(scm_pki::Error::FileAlreadyExists {
            path: PathBuf::from("/tmp/certificate.crt"),
        });
        assert!(matches!(err, CliError::Pki(_)));
        assert!(err.to_string().contains("/tmp/certificate.crt"));
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }
}
