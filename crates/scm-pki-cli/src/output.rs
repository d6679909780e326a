//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use scm_pki::Certificate;
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Summary of a certificate and where it is stored.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateInfo {
    /// Hex serial number.
    pub serial_number: String,
    /// Subject distinguished name.
    pub subject: String,
    /// Issuer distinguished name.
    pub issuer: String,
    /// Start of validity.
    pub not_before: DateTime<Utc>,
    /// End of validity.
    pub not_after: DateTime<Utc>,
    /// Whether the certificate is a CA.
    pub is_ca: bool,
    /// Subject alternative names.
    pub san: Vec<String>,
    /// Certificate file.
    pub path: String,
    /// Private key file, when one was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
    /// Key algorithm, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
}

impl CertificateInfo {
    /// Summarizes `cert` stored at `path`.
    #[must_use]
    pub fn new(cert: &Certificate, path: &Path) -> Self {
        Self {
            serial_number: cert.serial_number().to_string(),
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            not_before: cert.not_before(),
            not_after: cert.not_after(),
            is_ca: cert.is_ca(),
            san: cert.san().iter().map(ToString::to_string).collect(),
            path: path.display().to_string(),
            key_path: None,
            algorithm: None,
        }
    }

    /// Records the private key file and algorithm.
    #[must_use]
    pub fn with_key(mut self, key_path: &Path, algorithm: impl Into<String>) -> Self {
        self.key_path = Some(key_path.display().to_string());
        self.algorithm = Some(algorithm.into());
        self
    }
}

impl TableDisplay for CertificateInfo {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Certificate")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Serial:       {}", self.serial_number)?;
        writeln!(writer, "Subject:      {}", self.subject)?;
        writeln!(writer, "Issuer:       {}", self.issuer)?;
        writeln!(writer, "Not Before:   {}", self.not_before.to_rfc3339())?;
        writeln!(writer, "Not After:    {}", self.not_after.to_rfc3339())?;
        writeln!(writer, "CA:           {}", if self.is_ca { "yes" } else { "no" })?;
        if !self.san.is_empty() {
            writeln!(writer, "SAN:          {}", self.san.join(", "))?;
        }
        writeln!(writer, "Path:         {}", self.path)?;
        if let Some(key_path) = &self.key_path {
            writeln!(writer, "Key Path:     {key_path}")?;
        }
        if let Some(algorithm) = &self.algorithm {
            writeln!(writer, "Algorithm:    {algorithm}")?;
        }
        Ok(())
    }
}

/// Result of a DER export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportInfo {
    /// Hex serial number of the exported certificate.
    pub serial_number: String,
    /// Destination file.
    pub path: String,
    /// Number of DER bytes written.
    pub bytes: usize,
}

impl TableDisplay for ExportInfo {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "Exported certificate {} ({} bytes DER) to {}",
            self.serial_number, self.bytes, self.path
        )?;
        Ok(())
    }
}
