//! wrtmx - enumerate firmware build targets as a CI job matrix

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;

use wrtmx_cli::{Cli, render};
use wrtmx_schema::ReleaseIdentifier;

#[tokio::main]
async fn main() -> Result<()> {
    // Usage errors exit 1 (clap's default is 2); help and version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    // Logs go to stderr; stdout carries only the matrix.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let release =
        ReleaseIdentifier::new(&cli.release).context("release identifier must not be empty")?;
    let config = cli.load_config().context("failed to load configuration")?;

    let matrix = wrtmx_core::resolve_matrix(&config, &release)
        .await
        .with_context(|| format!("failed to resolve build matrix for release {release}"))?;
    tracing::info!(entries = matrix.len(), "writing build matrix");

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", render(&matrix)?).context("failed to write build matrix")?;
    stdout.flush().context("failed to write build matrix")?;
    Ok(())
}
