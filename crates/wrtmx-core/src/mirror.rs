//! Mirror selection.
//!
//! Candidates are probed in preference order and the first one that answers
//! becomes the [`ActiveMirror`] for the whole run. A probe only checks
//! reachability; a mirror that answers but lists nothing is still selected.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};
use wrtmx_schema::ReleaseIdentifier;

use crate::error::{FetchError, ResolveError};

/// A candidate release root, e.g. `https://downloads.example.org/releases/23.05.4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MirrorEndpoint(String);

impl MirrorEndpoint {
    /// Create an endpoint; trailing slashes are dropped.
    pub fn new(url: &str) -> Self {
        Self(url.trim().trim_end_matches('/').to_string())
    }

    /// Root URL without trailing slash.
    pub fn url(&self) -> &str {
        &self.0
    }

    /// Resolve a path relative to the root.
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.0, path.trim_start_matches('/'))
    }
}

impl std::fmt::Display for MirrorEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The endpoint chosen for a run. Only [`select_mirror`] produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveMirror(MirrorEndpoint);

impl ActiveMirror {
    /// Root URL without trailing slash.
    pub fn url(&self) -> &str {
        self.0.url()
    }

    /// Resolve a path relative to the root.
    pub fn join(&self, path: &str) -> String {
        self.0.join(path)
    }
}

impl std::fmt::Display for ActiveMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Check that `endpoint` answers a `HEAD` of its root listing.
///
/// Servers that refuse `HEAD` with 405 get a plain `GET` instead.
pub async fn probe(
    client: &Client,
    endpoint: &MirrorEndpoint,
    timeout: Duration,
) -> Result<(), FetchError> {
    let url = endpoint.join("");
    let mut status = client.head(&url).timeout(timeout).send().await?.status();
    if status == StatusCode::METHOD_NOT_ALLOWED {
        debug!(mirror = %endpoint, "HEAD not allowed, probing with GET");
        status = client.get(&url).timeout(timeout).send().await?.status();
    }
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::Status {
            url,
            status: status.as_u16(),
        })
    }
}

/// Probe `candidates` in order and return the first reachable one.
pub async fn select_mirror(
    client: &Client,
    release: &ReleaseIdentifier,
    candidates: &[MirrorEndpoint],
    timeout: Duration,
) -> Result<ActiveMirror, ResolveError> {
    if candidates.is_empty() {
        return Err(ResolveError::NoMirrors(release.to_string()));
    }

    for endpoint in candidates {
        match probe(client, endpoint, timeout).await {
            Ok(()) => {
                info!(mirror = %endpoint, "selected mirror");
                return Ok(ActiveMirror(endpoint.clone()));
            }
            Err(e) => warn!(mirror = %endpoint, error = %e, "mirror unreachable"),
        }
    }

    Err(ResolveError::NoReachableMirror {
        release: release.to_string(),
        tried: candidates.iter().map(|c| c.url().to_string()).collect(),
    })
}

#[cfg(test)]
impl ActiveMirror {
    /// Skip probing in unit tests that mock a single server.
    pub(crate) fn for_tests(url: &str) -> Self {
        Self(MirrorEndpoint::new(url))
    }
}
