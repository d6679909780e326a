//! Conversions between [`Certificate`] and its PEM, DER and TLS-stack forms,
//! plus component-scoped certificate files.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rustls_pki_types::CertificateDer;
use tracing::{debug, info};
use x509_parser::pem::Pem;

use crate::certificate::Certificate;
use crate::config::SecurityConfig;
use crate::error::{Error, Result};
use crate::keys::PrivateKey;
use crate::paths::{SecurityPaths, StorageLocation};
use crate::persist::{self, WriteMode};

/// First line of a PEM certificate.
pub const BEGIN_CERT: &str = "-----BEGIN CERTIFICATE-----";

/// Last line of a PEM certificate.
pub const END_CERT: &str = "-----END CERTIFICATE-----";

const PEM_LINE_WIDTH: usize = 64;

/// An encoded certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedForm {
    /// PEM text with `CERTIFICATE` markers.
    Pem(String),
    /// Raw DER bytes.
    Der(Vec<u8>),
}

impl EncodedForm {
    /// Decodes into a certificate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the payload is malformed.
    pub fn decode(&self) -> Result<Certificate> {
        match self {
            Self::Pem(text) => CertificateCodec::decode_pem(text),
            Self::Der(der) => CertificateCodec::decode_der(der),
        }
    }
}

/// Reads, writes and converts certificates for one component.
///
/// The codec resolves its default directory once, at construction:
/// `<metadata_dir>/<security_dir_name>/<component>`.
#[derive(Debug, Clone)]
pub struct CertificateCodec {
    component: String,
    location: PathBuf,
    paths: SecurityPaths,
}

impl CertificateCodec {
    /// Creates a codec for `component` (e.g. `"scm"`, `"ca"`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the security directory name or the
    /// component label is not a plain directory name.
    pub fn new(config: &SecurityConfig, component: &str) -> Result<Self> {
        let paths = SecurityPaths::new(config)?;
        let location = paths.component_dir(component)?;
        Ok(Self {
            component: component.to_string(),
            location,
            paths,
        })
    }

    /// Returns the component label.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Returns the default directory for this component.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Returns the default certificate location.
    #[must_use]
    pub fn default_location(&self) -> StorageLocation {
        self.location_for(self.paths.default_certificate_file_name())
    }

    /// Returns a location in the default directory with a custom file name.
    #[must_use]
    pub fn location_for(&self, file_name: &str) -> StorageLocation {
        StorageLocation::new(self.location.clone(), file_name)
    }

    /// Encodes a certificate as PEM text.
    #[must_use]
    pub fn encode_pem(cert: &Certificate) -> String {
        encode_pem_block("CERTIFICATE", cert.der())
    }

    /// Decodes a single PEM certificate.
    ///
    /// Surrounding whitespace is ignored; anything else outside the markers
    /// is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] on missing markers, bad base64 or bad DER.
    pub fn decode_pem(text: &str) -> Result<Certificate> {
        let body = text
            .trim()
            .strip_prefix(BEGIN_CERT)
            .ok_or_else(|| Error::Encoding(format!("PEM must start with {BEGIN_CERT}")))?
            .strip_suffix(END_CERT)
            .ok_or_else(|| Error::Encoding(format!("PEM must end with {END_CERT}")))?;

        if body.contains("-----") {
            return Err(Error::Encoding(
                "expected exactly one CERTIFICATE block".into(),
            ));
        }

        let b64: String = body.split_whitespace().collect();
        let der = STANDARD
            .decode(b64.as_bytes())
            .map_err(|e| Error::Encoding(format!("invalid base64 payload: {e}")))?;

        Self::decode_der(&der)
    }

    /// Encodes several certificates as concatenated PEM blocks.
    #[must_use]
    pub fn encode_pem_bundle(certs: &[Certificate]) -> String {
        certs.iter().map(Self::encode_pem).collect()
    }

    /// Decodes every `CERTIFICATE` block in `text`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if a block is malformed, carries another
    /// label, or no block is present.
    pub fn decode_pem_bundle(text: &str) -> Result<Vec<Certificate>> {
        let mut certs = Vec::new();
        for pem in Pem::iter_from_buffer(text.as_bytes()) {
            let pem = pem.map_err(|e| Error::Encoding(format!("invalid PEM block: {e}")))?;
            if pem.label != "CERTIFICATE" {
                return Err(Error::Encoding(format!(
                    "expected CERTIFICATE block, got {}",
                    pem.label
                )));
            }
            certs.push(Self::decode_der(&pem.contents)?);
        }

        if certs.is_empty() {
            return Err(Error::Encoding("no CERTIFICATE block found".into()));
        }

        debug!(count = certs.len(), "decoded certificate bundle");
        Ok(certs)
    }

    /// Returns the DER encoding.
    #[must_use]
    pub fn encode_der(cert: &Certificate) -> Vec<u8> {
        cert.der().to_vec()
    }

    /// Decodes DER bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the bytes are not one X.509 certificate.
    pub fn decode_der(der: &[u8]) -> Result<Certificate> {
        Certificate::from_der(der)
    }

    /// Converts to the certificate type used by the TLS stack.
    #[must_use]
    pub fn to_platform(cert: &Certificate) -> CertificateDer<'static> {
        CertificateDer::from(cert.der().to_vec())
    }

    /// Converts from the certificate type used by the TLS stack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the bytes are not one X.509 certificate.
    pub fn from_platform(cert: &CertificateDer<'_>) -> Result<Certificate> {
        Certificate::from_der(cert.as_ref())
    }

    /// Writes PEM text to `location`, or to the default location when `None`.
    ///
    /// The text is written as given. Returns the path written.
    ///
    /// # Errors
    ///
    /// - [`Error::FileAlreadyExists`] if the file exists and `mode` is
    ///   [`WriteMode::CreateNew`]; the existing file is left untouched.
    /// - [`Error::Configuration`] if the file name is not a plain file name.
    /// - [`Error::Io`] on other filesystem failures.
    pub fn write_pem(
        &self,
        pem: &str,
        location: Option<&StorageLocation>,
        mode: WriteMode,
    ) -> Result<PathBuf> {
        let path = self.resolve(location)?;
        persist::write_atomic(&path, pem.as_bytes(), mode)?;
        Ok(path)
    }

    /// Encodes `cert` as PEM and writes it; see [`Self::write_pem`].
    ///
    /// # Errors
    ///
    /// As for [`Self::write_pem`].
    pub fn write_certificate(
        &self,
        cert: &Certificate,
        location: Option<&StorageLocation>,
        mode: WriteMode,
    ) -> Result<PathBuf> {
        let path = self.write_pem(&Self::encode_pem(cert), location, mode)?;
        info!(
            component = %self.component,
            serial = %cert.serial_number(),
            path = %path.display(),
            "stored certificate"
        );
        Ok(path)
    }

    /// Writes the DER encoding of `cert`; see [`Self::write_pem`] for the
    /// location and overwrite rules.
    ///
    /// # Errors
    ///
    /// As for [`Self::write_pem`].
    pub fn write_der(
        &self,
        cert: &Certificate,
        location: Option<&StorageLocation>,
        mode: WriteMode,
    ) -> Result<PathBuf> {
        let path = self.resolve(location)?;
        persist::write_atomic(&path, cert.der(), mode)?;
        Ok(path)
    }

    /// Writes a private key as PEM. `None` selects the default private key
    /// file in the component directory.
    ///
    /// # Errors
    ///
    /// As for [`Self::write_pem`].
    pub fn write_private_key(
        &self,
        key: &PrivateKey,
        location: Option<&StorageLocation>,
        mode: WriteMode,
    ) -> Result<PathBuf> {
        let path = match location {
            Some(location) => location.path()?,
            None => self
                .location_for(self.paths.default_private_key_file_name())
                .path()?,
        };
        persist::write_atomic(&path, key.pem().as_bytes(), mode)?;
        info!(component = %self.component, path = %path.display(), "stored private key");
        Ok(path)
    }

    /// Reads the certificate at `location`, or at the default location when
    /// `None`.
    ///
    /// # Errors
    ///
    /// - [`Error::FileNotFound`] if the file is absent.
    /// - [`Error::Encoding`] if the file is not a PEM certificate.
    pub fn read_certificate(&self, location: Option<&StorageLocation>) -> Result<Certificate> {
        let path = self.resolve(location)?;
        let text = persist::read_text(&path)?;
        let cert = Self::decode_pem(&text)?;
        debug!(
            component = %self.component,
            serial = %cert.serial_number(),
            path = %path.display(),
            "loaded certificate"
        );
        Ok(cert)
    }

    fn resolve(&self, location: Option<&StorageLocation>) -> Result<PathBuf> {
        match location {
            Some(location) => location.path(),
            None => self.default_location().path(),
        }
    }
}

impl From<&Certificate> for CertificateDer<'static> {
    fn from(cert: &Certificate) -> Self {
        CertificateCodec::to_platform(cert)
    }
}

impl TryFrom<&CertificateDer<'_>> for Certificate {
    type Error = Error;

    fn try_from(cert: &CertificateDer<'_>) -> Result<Self> {
        CertificateCodec::from_platform(cert)
    }
}

/// Wraps DER bytes in PEM markers with a 64-column base64 body and a single
/// trailing newline.
pub(crate) fn encode_pem_block(label: &str, der: &[u8]) -> String {
    let b64 = STANDARD.encode(der);
    let mut out = String::with_capacity(b64.len() + b64.len() / PEM_LINE_WIDTH + 2 * label.len() + 40);
    out.push_str("-----BEGIN ");
    out.push_str(label);
    out.push_str("-----\n");
    for line in b64.as_bytes().chunks(PEM_LINE_WIDTH) {
        // base64 output is ASCII, so every chunk is valid UTF-8.
        out.push_str(std::str::from_utf8(line).unwrap_or_default());
        out.push('\n');
    }
    out.push_str("-----END ");
    out.push_str(label);
    out.push_str("-----\n");
    out
}
