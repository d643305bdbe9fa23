//! wrtmx command-line surface: argument definitions, config assembly, and
//! output rendering. `main.rs` wires these to the resolution engine.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use wrtmx_core::{Config, ConfigError};
use wrtmx_schema::BuildMatrix;

/// Enumerate the build targets of a firmware release as a CI job matrix.
#[derive(Parser, Debug)]
#[command(name = "wrtmx", author, version, about, long_about = None)]
pub struct Cli {
    /// Release identifier (e.g. 23.05.4 or 24.10-SNAPSHOT)
    pub release: String,

    /// TOML config file (mirrors, timeouts, architecture overrides)
    #[arg(short, long, env = "WRTMX_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Mirror URL template with a {version} placeholder; repeat in preference order
    #[arg(long = "mirror", value_name = "URL_TEMPLATE")]
    pub mirrors: Vec<String>,

    /// Maximum concurrent listing / resolution requests
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Built-in defaults, then the config file, then flags.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if !self.mirrors.is_empty() {
            config.mirrors.releases.clone_from(&self.mirrors);
            config.mirrors.snapshots.clone_from(&self.mirrors);
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        config.validate()?;
        Ok(config)
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// The single-line JSON document written to stdout.
pub fn render(matrix: &BuildMatrix) -> serde_json::Result<String> {
    serde_json::to_string(matrix)
}
