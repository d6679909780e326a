//! Security configuration consumed by the key source, builder and codec.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::keys::KeyAlgorithm;

/// Default name of the security directory under the metadata directory.
pub const DEFAULT_SECURITY_DIR_NAME: &str = "security";

/// Default certificate file name.
pub const DEFAULT_CERTIFICATE_FILE_NAME: &str = "certificate.crt";

/// Default private key file name.
pub const DEFAULT_PRIVATE_KEY_FILE_NAME: &str = "private.pem";

/// Default validity of newly generated certificates, in days.
pub const DEFAULT_CERTIFICATE_DURATION_DAYS: u32 = 365;

/// Longest validity window the builder accepts, in days.
pub const MAX_CERTIFICATE_DURATION_DAYS: u32 = 1865;

/// Security settings for certificate generation and storage.
///
/// Every field has a default, so a JSON file only needs to name the values
/// it changes:
///
/// ```
/// use scm_pki::{KeyAlgorithm, SecurityConfig};
///
/// let config = SecurityConfig::from_json_str(
///     r#"{ "metadata_dir": "/var/lib/scm", "key_algorithm": "ed25519" }"#,
/// ).unwrap();
/// assert_eq!(config.key_algorithm(), KeyAlgorithm::Ed25519);
/// assert_eq!(config.certificate_file_name(), "certificate.crt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    metadata_dir: PathBuf,
    security_dir_name: String,
    certificate_file_name: String,
    private_key_file_name: String,
    key_algorithm: KeyAlgorithm,
    default_certificate_duration_days: u32,
    max_certificate_duration_days: u32,
}

impl SecurityConfig {
    /// Creates a configuration rooted at `metadata_dir` with default values.
    #[must_use]
    pub fn new(metadata_dir: impl Into<PathBuf>) -> Self {
        Self {
            metadata_dir: metadata_dir.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the text is not a valid configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("invalid security configuration: {e}")))
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the file is absent and
    /// [`Error::Configuration`] if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_json_str(&text)?;
        debug!(path = %path.display(), "loaded security configuration");
        Ok(config)
    }

    /// Sets the metadata directory.
    #[must_use]
    pub fn with_metadata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.metadata_dir = dir.into();
        self
    }

    /// Sets the security directory name.
    #[must_use]
    pub fn with_security_dir_name(mut self, name: impl Into<String>) -> Self {
        self.security_dir_name = name.into();
        self
    }

    /// Sets the default certificate file name.
    #[must_use]
    pub fn with_certificate_file_name(mut self, name: impl Into<String>) -> Self {
        self.certificate_file_name = name.into();
        self
    }

    /// Sets the default private key file name.
    #[must_use]
    pub fn with_private_key_file_name(mut self, name: impl Into<String>) -> Self {
        self.private_key_file_name = name.into();
        self
    }

    /// Sets the key algorithm.
    #[must_use]
    pub const fn with_key_algorithm(mut self, algorithm: KeyAlgorithm) -> Self {
        self.key_algorithm = algorithm;
        self
    }

    /// Sets the default certificate validity in days.
    #[must_use]
    pub const fn with_default_certificate_duration_days(mut self, days: u32) -> Self {
        self.default_certificate_duration_days = days;
        self
    }

    /// Sets the maximum certificate validity in days.
    #[must_use]
    pub const fn with_max_certificate_duration_days(mut self, days: u32) -> Self {
        self.max_certificate_duration_days = days;
        self
    }

    /// Returns the metadata directory.
    #[must_use]
    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    /// Returns the security directory name.
    #[must_use]
    pub fn security_dir_name(&self) -> &str {
        &self.security_dir_name
    }

    /// Returns the default certificate file name.
    #[must_use]
    pub fn certificate_file_name(&self) -> &str {
        &self.certificate_file_name
    }

    /// Returns the default private key file name.
    #[must_use]
    pub fn private_key_file_name(&self) -> &str {
        &self.private_key_file_name
    }

    /// Returns the key algorithm.
    #[must_use]
    pub const fn key_algorithm(&self) -> KeyAlgorithm {
        self.key_algorithm
    }

    /// Returns the default certificate validity in days.
    #[must_use]
    pub const fn default_certificate_duration_days(&self) -> u32 {
        self.default_certificate_duration_days
    }

    /// Returns the maximum certificate validity in days.
    #[must_use]
    pub const fn max_certificate_duration_days(&self) -> u32 {
        self.max_certificate_duration_days
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            metadata_dir: PathBuf::from("."),
            security_dir_name: DEFAULT_SECURITY_DIR_NAME.to_string(),
            certificate_file_name: DEFAULT_CERTIFICATE_FILE_NAME.to_string(),
            private_key_file_name: DEFAULT_PRIVATE_KEY_FILE_NAME.to_string(),
            key_algorithm: KeyAlgorithm::default(),
            default_certificate_duration_days: DEFAULT_CERTIFICATE_DURATION_DAYS,
            max_certificate_duration_days: MAX_CERTIFICATE_DURATION_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = SecurityConfig::new("/var/lib/scm");
        assert_eq!(config.metadata_dir(), Path::new("/var/lib/scm"));
        assert_eq!(config.security_dir_name(), "security");
        assert_eq!(config.certificate_file_name(), "certificate.crt");
        assert_eq!(config.private_key_file_name(), "private.pem");
        assert_eq!(config.key_algorithm(), KeyAlgorithm::EcdsaP256Sha256);
        assert_eq!(config.default_certificate_duration_days(), 365);
        assert_eq!(config.max_certificate_duration_days(), 1865);
    }

    #[test]
    fn setters_override_defaults() {
        let config = SecurityConfig::default()
            .with_metadata_dir("/data")
            .with_security_dir_name("certs")
            .with_certificate_file_name("ca.crt")
            .with_private_key_file_name("ca.key")
            .with_key_algorithm(KeyAlgorithm::EcdsaP384Sha384)
            .with_default_certificate_duration_days(30)
            .with_max_certificate_duration_days(90);

        assert_eq!(config.metadata_dir(), Path::new("/data"));
        assert_eq!(config.security_dir_name(), "certs");
        assert_eq!(config.certificate_file_name(), "ca.crt");
        assert_eq!(config.private_key_file_name(), "ca.key");
        assert_eq!(config.key_algorithm(), KeyAlgorithm::EcdsaP384Sha384);
        assert_eq!(config.default_certificate_duration_days(), 30);
        assert_eq!(config.max_certificate_duration_days(), 90);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            SecurityConfig::from_json_str(r#"{ "metadata_dir": "/meta", "security_dir_name": "keys" }"#)
                .unwrap();
        assert_eq!(config.metadata_dir(), Path::new("/meta"));
        assert_eq!(config.security_dir_name(), "keys");
        assert_eq!(config.certificate_file_name(), DEFAULT_CERTIFICATE_FILE_NAME);
    }

    #[test]
    fn invalid_json_is_configuration_error() {
        let result = SecurityConfig::from_json_str(r#"{ "key_algorithm": "dsa" }"#);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn json_round_trip() {
        let config = SecurityConfig::new("/meta").with_key_algorithm(KeyAlgorithm::Ed25519);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SecurityConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("security.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{ "certificate_file_name": "scm.crt" }}"#).unwrap();

        let config = SecurityConfig::load(&path).unwrap();
        assert_eq!(config.certificate_file_name(), "scm.crt");
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = SecurityConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }
}
