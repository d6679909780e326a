//! `export-der`: write a stored certificate in DER form.

use std::io::Write;
use std::path::Path;

use scm_pki::{CertificateCodec, SecurityConfig, StorageLocation, WriteMode};

use crate::error::CliError;
use crate::output::{ExportInfo, OutputFormat};

/// DER export command executor.
pub struct ExportDerCommand {
    config: SecurityConfig,
    component: String,
}

impl ExportDerCommand {
    /// Create a new export command.
    #[must_use]
    pub fn new(config: SecurityConfig, component: impl Into<String>) -> Self {
        Self {
            config,
            component: component.into(),
        }
    }

    /// Execute the export command.
    ///
    /// # Errors
    ///
    /// Returns an error if `out` has no file name, the certificate cannot be
    /// read, or the destination exists and `force` is not set.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        out: &Path,
        file_name: Option<&str>,
        force: bool,
    ) -> Result<(), CliError> {
        let target_name = out
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                CliError::InvalidArgument(format!("{} has no file name", out.display()))
            })?;
        let target_dir = out.parent().unwrap_or_else(|| Path::new(""));
        let target = StorageLocation::new(target_dir, target_name);

        let codec = CertificateCodec::new(&self.config, &self.component)?;
        let source = file_name.map(|name| codec.location_for(name));
        let cert = codec.read_certificate(source.as_ref())?;
        let path = codec.write_der(&cert, Some(&target), WriteMode::from_overwrite(force))?;

        let summary = ExportInfo {
            serial_number: cert.serial_number().to_string(),
            path: path.display().to_string(),
            bytes: cert.der().len(),
        };
        format.write(writer, &summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_without_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = ExportDerCommand::new(SecurityConfig::new(dir.path()), "scm");
        let result = cmd.execute(
            &mut Vec::new(),
            &OutputFormat::default(),
            Path::new("/"),
            None,
            false,
        );
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn missing_source_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = ExportDerCommand::new(SecurityConfig::new(dir.path()), "scm");
        let result = cmd.execute(
            &mut Vec::new(),
            &OutputFormat::default(),
            &dir.path().join("ca.der"),
            None,
            false,
        );
        assert!(matches!(
            result,
            Err(CliError::Pki(scm_pki::Error::FileNotFound { .. }))
        ));
        assert!(!dir.path().join("ca.der").exists());
    }
}
