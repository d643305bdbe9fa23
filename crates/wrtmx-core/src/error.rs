//! Error taxonomy for a resolution run.
//!
//! [`FetchError`] covers a single request and never escapes a listing call or
//! resolver tier. [`ResolveError`] is the set of conditions that abort a run.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of one upstream request.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The body could not be decoded as the expected document.
    #[error("malformed document at {url}: {source}")]
    Parse {
        /// Requested URL.
        url: String,
        /// Decoder error.
        source: serde_json::Error,
    },
}

/// Fatal conditions that terminate a run. No partial output is produced.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The configuration produced no candidate mirrors.
    #[error("no mirrors configured for release {0}")]
    NoMirrors(String),

    /// Every candidate mirror failed its reachability probe.
    #[error("no reachable mirror for release {release} (tried: {})", .tried.join(", "))]
    NoReachableMirror {
        /// Release identifier being resolved.
        release: String,
        /// Candidate roots in probe order.
        tried: Vec<String>,
    },

    /// The active mirror exposed no targets.
    #[error("no targets found on mirror {mirror}")]
    NoTargets {
        /// Root URL of the active mirror.
        mirror: String,
    },

    /// Traversal finished without producing a single matrix entry.
    #[error("build matrix is empty (mirror {mirror})")]
    EmptyMatrix {
        /// Root URL of the active mirror.
        mirror: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`Config`](crate::config::Config).
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// The configuration parsed but is unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}
