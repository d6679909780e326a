//! Command implementations.

mod export;
mod generate;
mod show;

use std::path::Path;

use scm_pki::SecurityConfig;
use tracing::debug;

pub use export::ExportDerCommand;
pub use generate::GenerateCommand;
pub use show::ShowCommand;

use crate::error::CliError;

/// Resolves the security configuration from an optional JSON file and an
/// optional metadata directory override.
///
/// # Errors
///
/// Returns an error if the configuration file cannot be read or parsed.
pub fn load_config(
    config_file: Option<&Path>,
    metadata_dir: Option<&Path>,
) -> Result<SecurityConfig, CliError> {
    let config = match config_file {
        Some(path) => SecurityConfig::load(path)?,
        None => SecurityConfig::default(),
    };
    let config = match metadata_dir {
        Some(dir) => config.with_metadata_dir(dir),
        None => config,
    };
    debug!(metadata_dir = %config.metadata_dir().display(), "resolved security configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_dir_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("security.json");
        std::fs::write(
            &file,
            r#"{"metadata_dir": "/from/file", "default_certificate_duration_days": 30}"#,
        )
        .unwrap();

        let config = load_config(Some(&file), Some(Path::new("/from/flag"))).unwrap();
        assert_eq!(config.metadata_dir(), Path::new("/from/flag"));
        assert_eq!(config.default_certificate_duration_days(), 30);
    }

    #[test]
    fn defaults_without_file() {
        let config = load_config(None, None).unwrap();
        assert_eq!(config, SecurityConfig::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("absent.json")), None);
        assert!(matches!(
            result,
            Err(CliError::Pki(scm_pki::Error::FileNotFound { .. }))
        ));
    }
}
