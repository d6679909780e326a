//! Certificate lifecycle core for the SCM certificate authority.
//!
//! This crate builds self-signed CA certificates, converts them between PEM,
//! DER and the TLS stack's certificate type, and stores them in
//! per-component directories with overwrite protection and owner-only
//! permissions.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use scm_pki::{Certificate, CertificateCodec, KeyGenerator, KeyPairSource, SecurityConfig, WriteMode};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = SecurityConfig::new(dir.path());
//!
//! let today = Utc::now().date_naive();
//! let cert = Certificate::builder()
//!     .subject("scm")
//!     .cluster_id("cluster-1")
//!     .scm_id("scm-1")
//!     .begin_date(today)
//!     .end_date(today + Duration::days(1))
//!     .config(&config)
//!     .key(KeyGenerator::new(&config).generate_key_pair().unwrap())
//!     .make_ca()
//!     .build()
//!     .unwrap();
//!
//! let codec = CertificateCodec::new(&config, "ca").unwrap();
//! codec.write_certificate(&cert, None, WriteMode::CreateNew).unwrap();
//!
//! let loaded = codec.read_certificate(None).unwrap();
//! assert_eq!(loaded.serial_number(), cert.serial_number());
//! ```
//!
//! # Modules
//!
//! - [`builder`] - Self-signed certificate builder
//! - [`certificate`] - Immutable certificate value
//! - [`codec`] - PEM/DER/TLS conversions and certificate files
//! - [`config`] - Security configuration
//! - [`keys`] - Key pair source and key material
//! - [`paths`] - Security directory layout
//! - [`persist`] - Atomic file writes
//! - [`error`] - Error types

#![forbid(unsafe_code)]

pub mod builder;
pub mod certificate;
pub mod codec;
pub mod config;
pub mod error;
pub mod keys;
pub mod paths;
pub mod persist;

// Re-export commonly used types at crate root
pub use builder::CertificateBuilder;
pub use certificate::{Certificate, SerialNumber, SubjectAltName};
pub use codec::{BEGIN_CERT, CertificateCodec, END_CERT, EncodedForm};
pub use config::SecurityConfig;
pub use error::{Error, Result};
pub use keys::{KeyAlgorithm, KeyGenerator, KeyPair, KeyPairSource, PrivateKey};
pub use paths::{SecurityPaths, StorageLocation};
pub use persist::WriteMode;
