//! Target-resolution engine for wrtmx.
//!
//! Given a release identifier, [`resolve_matrix`] selects a reachable mirror,
//! walks its target/subtarget hierarchy, resolves each subtarget's package
//! architecture, and returns the deduplicated [`BuildMatrix`](wrtmx_schema::BuildMatrix).

pub mod arch;
pub mod assembler;
pub mod config;
pub mod error;
pub mod layout;
pub mod listing;
pub mod mirror;
pub mod upstream;

pub use assembler::{MatrixAssembler, resolve_matrix};
pub use config::Config;
pub use error::{ConfigError, FetchError, ResolveError};

/// User Agent string sent with every upstream request.
pub const USER_AGENT: &str = concat!("wrtmx/", env!("CARGO_PKG_VERSION"));
