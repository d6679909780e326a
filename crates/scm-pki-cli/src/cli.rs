//! Command-line argument parsing with clap.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use scm_pki::KeyAlgorithm;

/// scm-ca - SCM certificate authority tooling.
#[derive(Parser, Debug, Clone)]
#[command(name = "scm-ca")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON security configuration file.
    #[arg(short, long, env = "SCM_CA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Metadata directory; overrides the configuration file.
    #[arg(short, long, env = "SCM_CA_METADATA_DIR")]
    pub metadata_dir: Option<PathBuf>,

    /// Component whose certificate directory is used.
    #[arg(long, default_value = "scm")]
    pub component: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate a key pair and a self-signed certificate.
    Generate(GenerateArgs),

    /// Show a stored certificate.
    Show {
        /// Certificate file name in the component directory.
        #[arg(long)]
        file_name: Option<String>,
    },

    /// Write a stored certificate as DER.
    ExportDer {
        /// Destination file.
        #[arg(short, long)]
        out: PathBuf,

        /// Certificate file name in the component directory.
        #[arg(long)]
        file_name: Option<String>,

        /// Replace the destination if it exists.
        #[arg(long)]
        force: bool,
    },
}

/// Arguments for `generate`.
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Subject common name.
    #[arg(long)]
    pub subject: String,

    /// Cluster identifier.
    #[arg(long)]
    pub cluster_id: String,

    /// SCM identifier.
    #[arg(long)]
    pub scm_id: String,

    /// Validity in days; defaults to the configured duration.
    #[arg(long)]
    pub days: Option<u32>,

    /// Mark the certificate as a certificate authority.
    #[arg(long)]
    pub ca: bool,

    /// DNS subject alternative name (repeatable).
    #[arg(long = "dns")]
    pub dns_names: Vec<String>,

    /// IP subject alternative name (repeatable).
    #[arg(long = "ip")]
    pub ip_addresses: Vec<IpAddr>,

    /// Key algorithm; overrides the configuration file.
    #[arg(long)]
    pub algorithm: Option<KeyAlgorithm>,

    /// Certificate file name in the component directory.
    #[arg(long)]
    pub file_name: Option<String>,

    /// Replace existing certificate and key files.
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_generate() {
        let cli = Cli::try_parse_from([
            "scm-ca",
            "--metadata-dir",
            "/meta",
            "--component",
            "ca",
            "generate",
            "--subject",
            "AB12",
            "--cluster-id",
            "CD34",
            "--scm-id",
            "EF56",
            "--days",
            "30",
            "--ca",
            "--dns",
            "scm.local",
            "--ip",
            "10.0.0.1",
            "--algorithm",
            "ed25519",
        ])
        .unwrap();

        assert_eq!(cli.component, "ca");
        assert_eq!(cli.metadata_dir, Some(PathBuf::from("/meta")));
        let Commands::Generate(args) = cli.command else {
            unreachable!("parsed a different subcommand");
        };
        assert_eq!(args.subject, "AB12");
        assert_eq!(args.days, Some(30));
        assert!(args.ca);
        assert!(!args.force);
        assert_eq!(args.dns_names, vec!["scm.local".to_string()]);
        assert_eq!(args.ip_addresses.len(), 1);
        assert_eq!(args.algorithm, Some(KeyAlgorithm::Ed25519));
    }

    #[test]
    fn parse_show_defaults() {
        let cli = Cli::try_parse_from(["scm-ca", "show"]).unwrap();
        assert_eq!(cli.component, "scm");
        assert_eq!(cli.format, Format::Table);
        assert!(matches!(cli.command, Commands::Show { file_name: None }));
    }

    #[test]
    fn parse_rejects_unknown_algorithm() {
        let result = Cli::try_parse_from([
            "scm-ca",
            "generate",
            "--subject",
            "a",
            "--cluster-id",
            "b",
            "--scm-id",
            "c",
            "--algorithm",
            "rsa",
        ]);
        assert!(result.is_err());
    }
}
