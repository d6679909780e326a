//! Key pair source and key material types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::codec::encode_pem_block;
use crate::config::SecurityConfig;
use crate::error::{Error, Result};

/// Asymmetric key algorithms supported for certificate signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyAlgorithm {
    /// ECDSA over P-256 with SHA-256.
    #[default]
    #[serde(rename = "ecdsa-p256")]
    EcdsaP256Sha256,
    /// ECDSA over P-384 with SHA-384.
    #[serde(rename = "ecdsa-p384")]
    EcdsaP384Sha384,
    /// Ed25519.
    Ed25519,
}

impl KeyAlgorithm {
    /// All supported algorithms.
    pub const ALL: [Self; 3] = [Self::EcdsaP256Sha256, Self::EcdsaP384Sha384, Self::Ed25519];

    /// Returns the configuration name of this algorithm.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::EcdsaP256Sha256 => "ecdsa-p256",
            Self::EcdsaP384Sha384 => "ecdsa-p384",
            Self::Ed25519 => "ed25519",
        }
    }

    pub(crate) fn signature_algorithm(self) -> &'static rcgen::SignatureAlgorithm {
        match self {
            Self::EcdsaP256Sha256 => &rcgen::PKCS_ECDSA_P256_SHA256,
            Self::EcdsaP384Sha384 => &rcgen::PKCS_ECDSA_P384_SHA384,
            Self::Ed25519 => &rcgen::PKCS_ED25519,
        }
    }

    fn from_signature_algorithm(alg: &rcgen::SignatureAlgorithm) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.signature_algorithm() == alg)
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Configuration(format!("unsupported key algorithm '{s}'")))
    }
}

/// A public/private key pair used to sign certificates.
pub struct KeyPair {
    inner: rcgen::KeyPair,
    algorithm: KeyAlgorithm,
}

impl KeyPair {
    /// Generates a fresh key pair for `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyGeneration`] if the crypto provider fails.
    pub fn generate(algorithm: KeyAlgorithm) -> Result<Self> {
        let inner = rcgen::KeyPair::generate_for(algorithm.signature_algorithm())
            .map_err(|e| Error::KeyGeneration(format!("failed to generate {algorithm} key pair: {e}")))?;
        Ok(Self { inner, algorithm })
    }

    /// Loads a key pair from a PEM-encoded PKCS#8 private key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the key cannot be parsed or uses an
    /// unsupported algorithm.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let inner = rcgen::KeyPair::from_pem(pem)
            .map_err(|e| Error::Encoding(format!("failed to parse private key: {e}")))?;
        let algorithm = KeyAlgorithm::from_signature_algorithm(inner.algorithm())
            .ok_or_else(|| Error::Encoding("private key uses an unsupported algorithm".into()))?;
        Ok(Self { inner, algorithm })
    }

    /// Returns the key algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Returns the raw public key bits (the `subjectPublicKey` of the SPKI).
    #[must_use]
    pub fn public_key_raw(&self) -> &[u8] {
        self.inner.public_key_raw()
    }

    /// Returns a copy of the PKCS#8 private key.
    #[must_use]
    pub fn private_key(&self) -> PrivateKey {
        PrivateKey::new(self.inner.serialize_der())
    }

    pub(crate) const fn as_rcgen(&self) -> &rcgen::KeyPair {
        &self.inner
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Produces key pairs on demand.
///
/// The builder consumes key material only through this contract, so tests
/// and HSM-backed deployments can plug in their own source.
pub trait KeyPairSource: Send + Sync {
    /// Generates a new key pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyGeneration`] if no key pair can be produced.
    fn generate_key_pair(&self) -> Result<KeyPair>;
}

/// Key pair source backed by the configured algorithm.
#[derive(Debug, Clone, Copy)]
pub struct KeyGenerator {
    algorithm: KeyAlgorithm,
}

impl KeyGenerator {
    /// Creates a generator using the algorithm named in `config`.
    #[must_use]
    pub const fn new(config: &SecurityConfig) -> Self {
        Self {
            algorithm: config.key_algorithm(),
        }
    }

    /// Creates a generator for a specific algorithm.
    #[must_use]
    pub const fn with_algorithm(algorithm: KeyAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Returns the algorithm this generator produces.
    #[must_use]
    pub const fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }
}

impl KeyPairSource for KeyGenerator {
    fn generate_key_pair(&self) -> Result<KeyPair> {
        let key = KeyPair::generate(self.algorithm)?;
        debug!(algorithm = %self.algorithm, "generated key pair");
        Ok(key)
    }
}

/// A private key with secure memory handling.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    /// DER-encoded PKCS#8 private key bytes.
    der: Vec<u8>,
}

impl PrivateKey {
    /// Creates a new private key from DER-encoded bytes.
    #[must_use]
    pub const fn new(der: Vec<u8>) -> Self {
        Self { der }
    }

    /// Returns the DER-encoded private key bytes.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Returns the PEM-encoded private key.
    #[must_use]
    pub fn pem(&self) -> String {
        encode_pem_block("PRIVATE KEY", &self.der)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("der", &"[REDACTED]")
            .finish()
    }
}

impl Clone for PrivateKey {
    fn clone(&self) -> Self {
        Self {
            der: self.der.clone(),
        }
    }
}
