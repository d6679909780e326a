//! `show`: print a stored certificate.

use std::io::Write;

use scm_pki::{CertificateCodec, SecurityConfig};

use crate::error::CliError;
use crate::output::{CertificateInfo, OutputFormat};

/// Show command executor.
pub struct ShowCommand {
    config: SecurityConfig,
    component: String,
}

impl ShowCommand {
    /// Create a new show command.
    #[must_use]
    pub fn new(config: SecurityConfig, component: impl Into<String>) -> Self {
        Self {
            config,
            component: component.into(),
        }
    }

    /// Execute the show command.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate is missing or unreadable.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        file_name: Option<&str>,
    ) -> Result<(), CliError> {
        let codec = CertificateCodec::new(&self.config, &self.component)?;
        let location = match file_name {
            Some(name) => codec.location_for(name),
            None => codec.default_location(),
        };
        let cert = codec.read_certificate(Some(&location))?;
        format.write(writer, &CertificateInfo::new(&cert, &location.path()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;

    #[test]
    fn missing_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = ShowCommand::new(SecurityConfig::new(dir.path()), "scm");
        let result = cmd.execute(&mut Vec::new(), &OutputFormat::default(), None);
        assert!(matches!(
            result,
            Err(CliError::Pki(scm_pki::Error::FileNotFound { .. }))
        ));
    }

    #[test]
    fn shows_custom_file_as_json() {
        use chrono::{Duration, Utc};
        use scm_pki::{Certificate, KeyGenerator, KeyPairSource, WriteMode};

        let dir = tempfile::tempdir().unwrap();
        let config = SecurityConfig::new(dir.path());
        let today = Utc::now().date_naive();
        let cert = Certificate::builder()
            .subject("AB12")
            .cluster_id("CD34")
            .scm_id("EF56")
            .begin_date(today)
            .end_date(today + Duration::days(1))
            .config(&config)
            .key(KeyGenerator::new(&config).generate_key_pair().unwrap())
            .build()
            .unwrap();
        let codec = CertificateCodec::new(&config, "scm").unwrap();
        codec
            .write_certificate(&cert, Some(&codec.location_for("peer.crt")), WriteMode::CreateNew)
            .unwrap();

        let mut out = Vec::new();
        ShowCommand::new(config, "scm")
            .execute(&mut out, &OutputFormat::new(Format::Json), Some("peer.crt"))
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["serial_number"], cert.serial_number().to_string());
        assert_eq!(value["is_ca"], false);
        assert!(value["path"].as_str().unwrap().ends_with("peer.crt"));
    }
}
