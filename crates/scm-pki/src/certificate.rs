//! Immutable X.509 certificate value.

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use x509_parser::prelude::*;

use crate::builder::CertificateBuilder;
use crate::error::{Error, Result};

/// Certificate serial number as unsigned big-endian bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SerialNumber(Vec<u8>);

impl SerialNumber {
    /// Creates a serial number from big-endian bytes. Leading zero bytes are
    /// dropped so equal values compare equal.
    #[must_use]
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Self(bytes[start..].to_vec())
    }

    /// Returns the big-endian bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<u64> for SerialNumber {
    fn from(value: u64) -> Self {
        Self::from_be_bytes(&value.to_be_bytes())
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("0");
        }
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Subject Alternative Name types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectAltName {
    /// DNS name.
    Dns(String),
    /// IP address.
    Ip(IpAddr),
}

impl fmt::Display for SubjectAltName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns(dns) => write!(f, "DNS:{dns}"),
            Self::Ip(ip) => write!(f, "IP:{ip}"),
        }
    }
}

/// A parsed, immutable X.509 certificate.
///
/// The value is always backed by its DER encoding; every other field is
/// derived from those bytes, so two certificates compare equal exactly when
/// their encodings do.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Certificate {
    der: Vec<u8>,
    serial_number: SerialNumber,
    subject: String,
    issuer: String,
    common_name: Option<String>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    is_ca: bool,
    public_key: Vec<u8>,
    signature: Vec<u8>,
    san: Vec<SubjectAltName>,
}

impl Certificate {
    /// Starts building a self-signed certificate.
    #[must_use]
    pub fn builder() -> CertificateBuilder {
        CertificateBuilder::new()
    }

    /// Parses a certificate from DER-encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the bytes are not exactly one
    /// well-formed X.509 certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (rest, cert) = X509Certificate::from_der(der)
            .map_err(|e| Error::Encoding(format!("failed to parse certificate: {e}")))?;
        if !rest.is_empty() {
            return Err(Error::Encoding(format!(
                "{} trailing bytes after certificate",
                rest.len()
            )));
        }

        let not_before = DateTime::from_timestamp(cert.validity().not_before.timestamp(), 0)
            .ok_or_else(|| Error::Encoding("invalid not_before timestamp".into()))?;
        let not_after = DateTime::from_timestamp(cert.validity().not_after.timestamp(), 0)
            .ok_or_else(|| Error::Encoding("invalid not_after timestamp".into()))?;

        let is_ca = cert
            .basic_constraints()
            .map_err(|e| Error::Encoding(format!("invalid basic constraints: {e}")))?
            .is_some_and(|ext| ext.value.ca);

        let parsed = Self {
            der: der.to_vec(),
            serial_number: SerialNumber::from_be_bytes(&cert.tbs_certificate.serial.to_bytes_be()),
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            common_name: extract_common_name(cert.subject()),
            not_before,
            not_after,
            is_ca,
            public_key: cert.public_key().raw.to_vec(),
            signature: cert.signature_value.data.to_vec(),
            san: extract_san(&cert)?,
        };

        debug!(serial = %parsed.serial_number, subject = %parsed.subject, "parsed certificate");

        Ok(parsed)
    }

    /// Returns the DER-encoded certificate bytes.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Returns the serial number.
    #[must_use]
    pub const fn serial_number(&self) -> &SerialNumber {
        &self.serial_number
    }

    /// Returns the subject distinguished name, e.g. `CN=scm, OU=scm-1, O=cluster-1`.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the issuer distinguished name.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the subject common name, if the subject carries a UTF-8 CN.
    #[must_use]
    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    /// Returns the certificate validity start time.
    #[must_use]
    pub const fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// Returns the certificate validity end time.
    #[must_use]
    pub const fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Returns true if basic constraints mark this certificate as a CA.
    #[must_use]
    pub const fn is_ca(&self) -> bool {
        self.is_ca
    }

    /// Returns the DER-encoded `SubjectPublicKeyInfo`.
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Returns the signature bits.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Returns the subject alternative names.
    #[must_use]
    pub fn san(&self) -> &[SubjectAltName] {
        &self.san
    }

    /// Returns true if issuer and subject are the same name.
    #[must_use]
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }

    /// Returns true if `at` falls inside the validity window.
    #[must_use]
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at <= self.not_after
    }

    /// Verifies that the certificate is signed by its own public key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the certificate is not self-issued or
    /// the signature does not verify.
    pub fn verify_self_signed(&self) -> Result<()> {
        if !self.is_self_issued() {
            return Err(Error::Encoding(format!(
                "certificate '{}' is not self-issued (issuer '{}')",
                self.subject, self.issuer
            )));
        }

        let (_, parsed) = X509Certificate::from_der(&self.der)
            .map_err(|e| Error::Encoding(format!("failed to parse certificate: {e}")))?;

        parsed
            .verify_signature(Some(parsed.public_key()))
            .map_err(|e| {
                Error::Encoding(format!(
                    "signature verification failed for '{}': {e:?}",
                    self.subject
                ))
            })
    }
}

/// Extracts the first common name from an X.509 name.
fn extract_common_name(name: &X509Name) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(String::from)
}

/// Extracts DNS and IP SANs from a certificate.
fn extract_san(cert: &X509Certificate) -> Result<Vec<SubjectAltName>> {
    let mut sans = Vec::new();

    let extension = cert
        .subject_alternative_name()
        .map_err(|e| Error::Encoding(format!("invalid subject alternative name: {e}")))?;
    if let Some(san_ext) = extension {
        for name in &san_ext.value.general_names {
            match name {
                GeneralName::DNSName(dns) => {
                    sans.push(SubjectAltName::Dns((*dns).to_string()));
                }
                GeneralName::IPAddress(ip_bytes) => {
                    if let Some(ip) = parse_ip_bytes(ip_bytes) {
                        sans.push(SubjectAltName::Ip(ip));
                    }
                }
                _ => {}
            }
        }
    }

    Ok(sans)
}

/// Parses IP address bytes into an `IpAddr`.
fn parse_ip_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(IpAddr::from(octets))
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(IpAddr::from(octets))
        }
        _ => None,
    }
}
