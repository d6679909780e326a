//! On-disk layout of security material.
//!
//! Certificates for a component live under
//! `<metadata_dir>/<security_dir_name>/<component>/`.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::config::SecurityConfig;
use crate::error::{Error, Result};

/// Resolves component directories and default file names from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityPaths {
    root: PathBuf,
    certificate_file_name: String,
    private_key_file_name: String,
}

impl SecurityPaths {
    /// Captures the security root and default file names from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the security directory name is not
    /// a single plain path segment.
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        validate_segment("security directory name", config.security_dir_name())?;
        Ok(Self {
            root: config.metadata_dir().join(config.security_dir_name()),
            certificate_file_name: config.certificate_file_name().to_string(),
            private_key_file_name: config.private_key_file_name().to_string(),
        })
    }

    /// Returns the security root directory.
    #[must_use]
    pub fn security_root(&self) -> &Path {
        &self.root
    }

    /// Returns `<security root>/<component>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `component` is not a single plain
    /// path segment.
    pub fn component_dir(&self, component: &str) -> Result<PathBuf> {
        validate_segment("component label", component)?;
        let dir = self.root.join(component);
        debug!(component, dir = %dir.display(), "resolved component directory");
        Ok(dir)
    }

    /// Returns the default certificate file name.
    #[must_use]
    pub fn default_certificate_file_name(&self) -> &str {
        &self.certificate_file_name
    }

    /// Returns the default private key file name.
    #[must_use]
    pub fn default_private_key_file_name(&self) -> &str {
        &self.private_key_file_name
    }
}

/// A directory plus a file name inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageLocation {
    directory: PathBuf,
    file_name: String,
}

impl StorageLocation {
    /// Creates a location.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_name: file_name.into(),
        }
    }

    /// Returns the directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the same directory with a different file name.
    #[must_use]
    pub fn with_file_name(&self, file_name: impl Into<String>) -> Self {
        Self::new(self.directory.clone(), file_name)
    }

    /// Returns the full path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the file name is not a single plain
    /// path segment.
    pub fn path(&self) -> Result<PathBuf> {
        validate_segment("file name", &self.file_name)?;
        Ok(self.directory.join(&self.file_name))
    }
}

/// Rejects empty names, `.`/`..` and anything containing a separator.
fn validate_segment(kind: &str, value: &str) -> Result<()> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(segment)), None) if segment == value => Ok(()),
        _ => Err(Error::Configuration(format!(
            "{kind} '{value}' must be a single plain path segment"
        ))),
    }
}
