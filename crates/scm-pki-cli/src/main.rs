//! `scm-ca` binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use scm_pki_cli::cli::{Cli, Commands};
use scm_pki_cli::commands::{ExportDerCommand, GenerateCommand, ShowCommand, load_config};
use scm_pki_cli::output::OutputFormat;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), scm_pki_cli::CliError> {
    let config = load_config(cli.config.as_deref(), cli.metadata_dir.as_deref())?;
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Generate(args) => {
            let cmd = GenerateCommand::new(config, &cli.component);
            cmd.execute(&mut stdout, &format, &args)?;
        }
        Commands::Show { file_name } => {
            let cmd = ShowCommand::new(config, &cli.component);
            cmd.execute(&mut stdout, &format, file_name.as_deref())?;
        }
        Commands::ExportDer {
            out,
            file_name,
            force,
        } => {
            let cmd = ExportDerCommand::new(config, &cli.component);
            cmd.execute(&mut stdout, &format, &out, file_name.as_deref(), force)?;
        }
    }

    Ok(())
}
