//! # scm-pki-cli
//!
//! The `scm-ca` command-line tool.
//!
//! Provides commands for:
//! - Generating a key pair and self-signed certificate for a component
//! - Showing a stored certificate
//! - Exporting a stored certificate as DER
//!
//! Certificates live under `<metadata-dir>/security/<component>/` as laid
//! out by [`scm_pki::SecurityPaths`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format, GenerateArgs};
pub use error::CliError;
pub use output::OutputFormat;
