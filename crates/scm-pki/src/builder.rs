//! Self-signed certificate builder.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rcgen::{
    BasicConstraints, CertificateParams, DnType, Ia5String, IsCa, KeyUsagePurpose, SanType,
};
use tracing::info;

use crate::certificate::{Certificate, SerialNumber, SubjectAltName};
use crate::config::SecurityConfig;
use crate::error::{Error, Result};
use crate::keys::{KeyPair, KeyPairSource};

/// Where the builder gets its signing key from.
enum KeyMaterial {
    Pair(KeyPair),
    Source(Arc<dyn KeyPairSource>),
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pair(pair) => f.debug_tuple("Pair").field(pair).finish(),
            Self::Source(_) => f.write_str("Source"),
        }
    }
}

/// Builder for self-signed certificates.
///
/// Every setter consumes the builder and returns the updated value.
///
/// ```
/// use chrono::{Duration, Utc};
/// use scm_pki::{Certificate, KeyGenerator, KeyPairSource, SecurityConfig};
///
/// let config = SecurityConfig::default();
/// let today = Utc::now().date_naive();
/// let cert = Certificate::builder()
///     .subject("scm")
///     .cluster_id("cluster-1")
///     .scm_id("scm-1")
///     .begin_date(today)
///     .end_date(today + Duration::days(365))
///     .config(&config)
///     .key(KeyGenerator::new(&config).generate_key_pair().unwrap())
///     .make_ca()
///     .build()
///     .unwrap();
///
/// assert!(cert.is_ca());
/// assert_eq!(cert.issuer(), cert.subject());
/// ```
#[derive(Debug, Default)]
pub struct CertificateBuilder {
    subject: Option<String>,
    cluster_id: Option<String>,
    scm_id: Option<String>,
    begin_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    config: Option<SecurityConfig>,
    key: Option<KeyMaterial>,
    is_ca: bool,
    san: Vec<SubjectAltName>,
}

impl CertificateBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the subject common name.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the cluster identifier, carried as the organization.
    #[must_use]
    pub fn cluster_id(mut self, cluster_id: impl Into<String>) -> Self {
        self.cluster_id = Some(cluster_id.into());
        self
    }

    /// Sets the SCM identifier, carried as the organizational unit.
    #[must_use]
    pub fn scm_id(mut self, scm_id: impl Into<String>) -> Self {
        self.scm_id = Some(scm_id.into());
        self
    }

    /// Sets the first day of validity (UTC midnight).
    #[must_use]
    pub const fn begin_date(mut self, date: NaiveDate) -> Self {
        self.begin_date = Some(date);
        self
    }

    /// Sets the day validity ends (UTC midnight).
    #[must_use]
    pub const fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Sets the security configuration used for algorithm checks and limits.
    #[must_use]
    pub fn config(mut self, config: &SecurityConfig) -> Self {
        self.config = Some(config.clone());
        self
    }

    /// Sets the key pair to bind and sign with.
    #[must_use]
    pub fn key(mut self, key: KeyPair) -> Self {
        self.key = Some(KeyMaterial::Pair(key));
        self
    }

    /// Defers key generation to `source`; the key is only generated once all
    /// other parameters have been validated.
    #[must_use]
    pub fn key_source(mut self, source: Arc<dyn KeyPairSource>) -> Self {
        self.key = Some(KeyMaterial::Source(source));
        self
    }

    /// Marks the certificate as a certificate authority.
    #[must_use]
    pub const fn make_ca(mut self) -> Self {
        self.is_ca = true;
        self
    }

    /// Adds a DNS subject alternative name.
    #[must_use]
    pub fn dns_name(mut self, dns: impl Into<String>) -> Self {
        self.san.push(SubjectAltName::Dns(dns.into()));
        self
    }

    /// Adds an IP subject alternative name.
    #[must_use]
    pub fn ip_address(mut self, ip: IpAddr) -> Self {
        self.san.push(SubjectAltName::Ip(ip));
        self
    }

    /// Builds and self-signs the certificate.
    ///
    /// Parameters are checked before any key or signature work happens.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if a required parameter is missing or empty,
    ///   or the key does not match the configured algorithm.
    /// - [`Error::Validity`] if the end date is not after the begin date or the
    ///   window exceeds the configured maximum.
    /// - [`Error::KeyGeneration`] if a key source fails.
    /// - [`Error::Encoding`] if signing or serialization fails.
    pub fn build(self) -> Result<Certificate> {
        let mut missing = Vec::new();
        if self.subject.is_none() {
            missing.push("subject");
        }
        if self.cluster_id.is_none() {
            missing.push("cluster_id");
        }
        if self.scm_id.is_none() {
            missing.push("scm_id");
        }
        if self.begin_date.is_none() {
            missing.push("begin_date");
        }
        if self.end_date.is_none() {
            missing.push("end_date");
        }
        if self.config.is_none() {
            missing.push("config");
        }
        if self.key.is_none() {
            missing.push("key");
        }

        let (
            Some(subject),
            Some(cluster_id),
            Some(scm_id),
            Some(begin_date),
            Some(end_date),
            Some(config),
            Some(key),
        ) = (
            self.subject,
            self.cluster_id,
            self.scm_id,
            self.begin_date,
            self.end_date,
            self.config,
            self.key,
        )
        else {
            return Err(Error::Configuration(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        };

        for (field, value) in [
            ("subject", &subject),
            ("cluster_id", &cluster_id),
            ("scm_id", &scm_id),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Configuration(format!("{field} cannot be empty")));
            }
        }

        if end_date <= begin_date {
            return Err(Error::Validity(format!(
                "end date {end_date} must be after begin date {begin_date}"
            )));
        }
        let days = (end_date - begin_date).num_days();
        let max_days = i64::from(config.max_certificate_duration_days());
        if days > max_days {
            return Err(Error::Validity(format!(
                "validity of {days} days exceeds the maximum of {max_days} days"
            )));
        }

        let key = match key {
            KeyMaterial::Pair(pair) => pair,
            KeyMaterial::Source(source) => source.generate_key_pair()?,
        };
        if key.algorithm() != config.key_algorithm() {
            return Err(Error::Configuration(format!(
                "key algorithm {} does not match configured {}",
                key.algorithm(),
                config.key_algorithm()
            )));
        }

        let serial = random_serial();

        let mut params = CertificateParams::default();
        params.distinguished_name.push(DnType::CommonName, subject.as_str());
        params
            .distinguished_name
            .push(DnType::OrganizationalUnitName, scm_id.as_str());
        params
            .distinguished_name
            .push(DnType::OrganizationName, cluster_id.as_str());
        params.serial_number = Some(rcgen::SerialNumber::from_slice(serial.as_bytes()));
        params.not_before = midnight_utc(begin_date)?;
        params.not_after = midnight_utc(end_date)?;
        params.subject_alt_names = convert_sans(&self.san)?;

        if self.is_ca {
            params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
            params.key_usages = vec![
                KeyUsagePurpose::KeyCertSign,
                KeyUsagePurpose::CrlSign,
                KeyUsagePurpose::DigitalSignature,
            ];
        } else {
            params.is_ca = IsCa::ExplicitNoCa;
            params.key_usages = vec![
                KeyUsagePurpose::DigitalSignature,
                KeyUsagePurpose::KeyEncipherment,
            ];
        }

        let signed = params
            .self_signed(key.as_rcgen())
            .map_err(|e| Error::Encoding(format!("failed to self-sign certificate: {e}")))?;

        let certificate = Certificate::from_der(signed.der())?;

        info!(
            subject = %certificate.subject(),
            serial = %certificate.serial_number(),
            ca = certificate.is_ca(),
            not_after = %certificate.not_after(),
            "built self-signed certificate"
        );

        Ok(certificate)
    }
}

/// Returns a random positive 63-bit serial number.
fn random_serial() -> SerialNumber {
    let value = rand::random::<u64>() >> 1;
    SerialNumber::from(value.max(1))
}

/// Converts a date to an rcgen timestamp at UTC midnight.
fn midnight_utc(date: NaiveDate) -> Result<time::OffsetDateTime> {
    let timestamp = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    time::OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| Error::Validity(format!("invalid date {date}: {e}")))
}

/// Converts `SubjectAltNames` to rcgen `SanTypes`.
fn convert_sans(sans: &[SubjectAltName]) -> Result<Vec<SanType>> {
    sans.iter()
        .map(|san| match san {
            SubjectAltName::Dns(dns) => {
                let ia5 = Ia5String::try_from(dns.clone())
                    .map_err(|e| Error::Configuration(format!("invalid DNS name '{dns}': {e}")))?;
                Ok(SanType::DnsName(ia5))
            }
            SubjectAltName::Ip(ip) => Ok(SanType::IpAddress(*ip)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyAlgorithm, KeyGenerator};
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Key source that counts how often it was asked for a key.
    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    impl KeyPairSource for CountingSource {
        fn generate_key_pair(&self) -> Result<KeyPair> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            KeyPair::generate(KeyAlgorithm::EcdsaP256Sha256)
        }
    }

    struct FailingSource;

    impl KeyPairSource for FailingSource {
        fn generate_key_pair(&self) -> Result<KeyPair> {
            Err(Error::KeyGeneration("provider unavailable".into()))
        }
    }

    fn complete(config: &SecurityConfig) -> CertificateBuilder {
        let today = Utc::now().date_naive();
        CertificateBuilder::new()
            .subject("AB12")
            .cluster_id("CD34")
            .scm_id("EF56")
            .begin_date(today)
            .end_date(today + Duration::days(1))
            .config(config)
    }

    #[test]
    fn builds_self_signed_ca() {
        let config = SecurityConfig::default();
        let key = KeyGenerator::new(&config).generate_key_pair().unwrap();
        let public = key.public_key_raw().to_vec();

        let cert = complete(&config).key(key).make_ca().build().unwrap();

        assert_eq!(cert.common_name(), Some("AB12"));
        assert_eq!(cert.subject(), cert.issuer());
        assert!(cert.is_ca());
        cert.verify_self_signed().unwrap();

        // SPKI ends with the raw subjectPublicKey bits.
        assert!(cert.public_key().ends_with(&public));
    }

    #[test]
    fn missing_fields_are_reported() {
        let result = CertificateBuilder::new().subject("only-subject").build();
        assert!(matches!(
            &result,
            Err(Error::Configuration(msg))
                if msg.contains("cluster_id")
                    && msg.contains("scm_id")
                    && msg.contains("key")
                    && !msg.contains("subject,")
        ));
    }

    #[test]
    fn missing_key_is_configuration_error() {
        let config = SecurityConfig::default();
        let result = complete(&config).build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn empty_subject_is_configuration_error() {
        let config = SecurityConfig::default();
        let result = complete(&config)
            .subject("  ")
            .key(KeyPair::generate(KeyAlgorithm::EcdsaP256Sha256).unwrap())
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn end_before_begin_fails_before_key_generation() {
        let config = SecurityConfig::default();
        let source = Arc::new(CountingSource::default());
        let today = Utc::now().date_naive();

        let result = complete(&config)
            .begin_date(today)
            .end_date(today - Duration::days(1))
            .key_source(source.clone())
            .build();

        assert!(matches!(result, Err(Error::Validity(_))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn equal_dates_are_rejected() {
        let config = SecurityConfig::default();
        let today = Utc::now().date_naive();
        let result = complete(&config)
            .end_date(today)
            .key(KeyPair::generate(KeyAlgorithm::EcdsaP256Sha256).unwrap())
            .build();
        assert!(matches!(result, Err(Error::Validity(_))));
    }

    #[test]
    fn window_longer_than_maximum_is_rejected() {
        let config = SecurityConfig::default().with_max_certificate_duration_days(10);
        let today = Utc::now().date_naive();
        let result = complete(&config)
            .end_date(today + Duration::days(11))
            .key(KeyPair::generate(KeyAlgorithm::EcdsaP256Sha256).unwrap())
            .build();
        assert!(matches!(result, Err(Error::Validity(_))));
    }

    #[test]
    fn key_source_is_used_once() {
        let config = SecurityConfig::default();
        let source = Arc::new(CountingSource::default());
        let cert = complete(&config).key_source(source.clone()).build().unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(!cert.is_ca());
    }

    #[test]
    fn key_generation_error_propagates() {
        let config = SecurityConfig::default();
        let result = complete(&config).key_source(Arc::new(FailingSource)).build();
        assert!(matches!(result, Err(Error::KeyGeneration(msg)) if msg == "provider unavailable"));
    }

    #[test]
    fn key_algorithm_must_match_config() {
        let config = SecurityConfig::default().with_key_algorithm(KeyAlgorithm::EcdsaP384Sha384);
        let result = complete(&config)
            .key(KeyPair::generate(KeyAlgorithm::EcdsaP256Sha256).unwrap())
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn ed25519_certificate() {
        let config = SecurityConfig::default().with_key_algorithm(KeyAlgorithm::Ed25519);
        let cert = complete(&config)
            .key(KeyPair::generate(KeyAlgorithm::Ed25519).unwrap())
            .make_ca()
            .build()
            .unwrap();
        cert.verify_self_signed().unwrap();
    }

    #[test]
    fn invalid_dns_name_is_rejected() {
        let config = SecurityConfig::default();
        let result = complete(&config)
            .key(KeyPair::generate(KeyAlgorithm::EcdsaP256Sha256).unwrap())
            .dns_name("bad\u{e9}name")
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn identical_inputs_give_comparable_certificates() {
        let config = SecurityConfig::default();
        let a = complete(&config)
            .key(KeyPair::generate(KeyAlgorithm::EcdsaP256Sha256).unwrap())
            .build()
            .unwrap();
        let b = complete(&config)
            .key(KeyPair::generate(KeyAlgorithm::EcdsaP256Sha256).unwrap())
            .build()
            .unwrap();
        assert_eq!(a.subject(), b.subject());
        assert_eq!(a.not_before(), b.not_before());
        assert_eq!(a.not_after(), b.not_after());
        assert_ne!(a.serial_number(), b.serial_number());
    }

    #[test]
    fn random_serial_is_positive() {
        for _ in 0..64 {
            let serial = random_serial();
            assert!(!serial.as_bytes().is_empty());
            assert!(serial.as_bytes().len() <= 8);
        }
    }
}
