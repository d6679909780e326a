//! `generate`: create a key pair and a self-signed certificate for a
//! component, then store both.

use std::io::Write;

use chrono::{Duration, Utc};
use scm_pki::{
    Certificate, CertificateCodec, Error, KeyGenerator, KeyPairSource, SecurityConfig, WriteMode,
};
use tracing::info;

use crate::cli::GenerateArgs;
use crate::error::CliError;
use crate::output::{CertificateInfo, OutputFormat};

/// Generate command executor.
pub struct GenerateCommand {
    config: SecurityConfig,
    component: String,
}

impl GenerateCommand {
    /// Create a new generate command.
    #[must_use]
    pub fn new(config: SecurityConfig, component: impl Into<String>) -> Self {
        Self {
            config,
            component: component.into(),
        }
    }

    /// Execute the generate command.
    ///
    /// Without `--force`, nothing is written if either the certificate or
    /// the private key file already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate cannot be built, a target file
    /// exists, or writing fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &GenerateArgs,
    ) -> Result<(), CliError> {
        let config = match args.algorithm {
            Some(algorithm) => self.config.clone().with_key_algorithm(algorithm),
            None => self.config.clone(),
        };
        let codec = CertificateCodec::new(&config, &self.component)?;
        let cert_location = match &args.file_name {
            Some(name) => codec.location_for(name),
            None => codec.default_location(),
        };
        let key_location = codec.location_for(config.private_key_file_name());
        if cert_location == key_location {
            return Err(CliError::InvalidArgument(format!(
                "certificate file name '{}' is also the private key file name",
                cert_location.file_name()
            )));
        }
        let mode = WriteMode::from_overwrite(args.force);

        if mode == WriteMode::CreateNew {
            for path in [cert_location.path()?, key_location.path()?] {
                if path.exists() {
                    return Err(Error::FileAlreadyExists { path }.into());
                }
            }
        }

        let days = args
            .days
            .unwrap_or_else(|| config.default_certificate_duration_days());
        let begin = Utc::now().date_naive();
        let end = begin
            .checked_add_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| {
                CliError::InvalidArgument(format!("--days {days} is out of range"))
            })?;
        let key = KeyGenerator::new(&config).generate_key_pair()?;
        let algorithm = key.algorithm();
        let private_key = key.private_key();

        let mut builder = Certificate::builder()
            .subject(&args.subject)
            .cluster_id(&args.cluster_id)
            .scm_id(&args.scm_id)
            .begin_date(begin)
            .end_date(end)
            .config(&config)
            .key(key);
        if args.ca {
            builder = builder.make_ca();
        }
        for dns in &args.dns_names {
            builder = builder.dns_name(dns);
        }
        for ip in &args.ip_addresses {
            builder = builder.ip_address(*ip);
        }
        let cert = builder.build()?;

        let cert_path = codec.write_certificate(&cert, Some(&cert_location), mode)?;
        let key_path = codec.write_private_key(&private_key, Some(&key_location), mode)?;
        info!(
            component = %self.component,
            serial = %cert.serial_number(),
            days,
            "generated certificate"
        );

        let summary = CertificateInfo::new(&cert, &cert_path).with_key(&key_path, algorithm.name());
        format.write(writer, &summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scm_pki::KeyAlgorithm;

    fn args() -> GenerateArgs {
        GenerateArgs {
            subject: "AB12".into(),
            cluster_id: "CD34".into(),
            scm_id: "EF56".into(),
            days: Some(10),
            ca: true,
            dns_names: vec!["scm.local".into()],
            ip_addresses: vec!["127.0.0.1".parse().unwrap()],
            algorithm: Some(KeyAlgorithm::Ed25519),
            file_name: None,
            force: false,
        }
    }

    #[test]
    fn generates_and_stores_certificate_and_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = SecurityConfig::new(dir.path());
        let cmd = GenerateCommand::new(config.clone(), "scm");

        let mut out = Vec::new();
        cmd.execute(&mut out, &OutputFormat::default(), &args()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("CN=AB12, OU=EF56, O=CD34"));
        assert!(text.contains("Algorithm:    ed25519"));

        let scm_dir = dir.path().join("security").join("scm");
        assert!(scm_dir.join("certificate.crt").is_file());
        assert!(scm_dir.join("private.pem").is_file());

        let codec = CertificateCodec::new(&config, "scm").unwrap();
        let stored = codec.read_certificate(None).unwrap();
        assert!(stored.is_ca());
        assert_eq!(stored.san().len(), 2);
        assert_eq!(stored.not_after() - stored.not_before(), Duration::days(10));
    }

    #[test]
    fn refuses_to_clobber_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = GenerateCommand::new(SecurityConfig::new(dir.path()), "scm");
        cmd.execute(&mut Vec::new(), &OutputFormat::default(), &args())
            .unwrap();
        let key_path = dir.path().join("security/scm/private.pem");
        let key_before = std::fs::read(&key_path).unwrap();

        let result = cmd.execute(&mut Vec::new(), &OutputFormat::default(), &args());
        assert!(matches!(
            result,
            Err(CliError::Pki(Error::FileAlreadyExists { .. }))
        ));
        assert_eq!(std::fs::read(&key_path).unwrap(), key_before);

        let forced = GenerateArgs {
            force: true,
            ..args()
        };
        cmd.execute(&mut Vec::new(), &OutputFormat::default(), &forced)
            .unwrap();
        assert_ne!(std::fs::read(&key_path).unwrap(), key_before);
    }

    #[test]
    fn rejects_certificate_named_like_key() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = GenerateCommand::new(SecurityConfig::new(dir.path()), "scm");

        for force in [false, true] {
            let clash = GenerateArgs {
                file_name: Some("private.pem".into()),
                force,
                ..args()
            };
            let result = cmd.execute(&mut Vec::new(), &OutputFormat::default(), &clash);
            assert!(matches!(result, Err(CliError::InvalidArgument(_))));
        }
        assert!(!dir.path().join("security/scm").exists());
    }

    #[test]
    fn rejects_days_beyond_calendar() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = GenerateCommand::new(SecurityConfig::new(dir.path()), "scm");
        let huge = GenerateArgs {
            days: Some(u32::MAX),
            ..args()
        };

        let result = cmd.execute(&mut Vec::new(), &OutputFormat::default(), &huge);
        assert!(matches!(result, Err(CliError::InvalidArgument(_))));
        assert!(!dir.path().join("security/scm/certificate.crt").exists());
    }

    #[test]
    fn rejects_duration_over_maximum() {
        let dir = tempfile::tempdir().unwrap();
        let config = SecurityConfig::new(dir.path()).with_max_certificate_duration_days(5);
        let cmd = GenerateCommand::new(config, "scm");

        let result = cmd.execute(&mut Vec::new(), &OutputFormat::default(), &args());
        assert!(matches!(result, Err(CliError::Pki(Error::Validity(_)))));
        assert!(!dir.path().join("security/scm/certificate.crt").exists());
    }
}
