//! Run configuration: mirror templates, timeouts, concurrency, and the
//! static architecture override table.
//!
//! Defaults are compiled in. A TOML file may replace any top-level field;
//! fields it omits keep their defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use wrtmx_schema::{ArchName, ReleaseIdentifier, SubtargetName, TargetName};

use crate::error::ConfigError;
use crate::mirror::MirrorEndpoint;

/// Placeholder substituted with the release identifier in mirror templates.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Candidate mirror URL templates, most preferred first.
    pub mirrors: MirrorTemplates,
    /// Timeout for each mirror reachability probe, in seconds.
    pub probe_timeout_secs: u64,
    /// Timeout for each listing or document fetch, in seconds.
    pub fetch_timeout_secs: u64,
    /// Maximum number of in-flight listing or resolution tasks.
    pub concurrency: usize,
    /// Static architecture table consulted before any network tier.
    pub overrides: Vec<ArchOverride>,
}

/// Mirror URL templates, split by release channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorTemplates {
    /// Templates for tagged releases.
    pub releases: Vec<String>,
    /// Templates for `*SNAPSHOT` identifiers.
    pub snapshots: Vec<String>,
}

/// Fixed architectures for one (target, subtarget) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchOverride {
    /// Target the override applies to.
    pub target: TargetName,
    /// Subtarget the override applies to.
    pub subtarget: SubtargetName,
    /// Architectures emitted for the pair, in order.
    pub archs: Vec<ArchName>,
}

impl Default for MirrorTemplates {
    fn default() -> Self {
        Self {
            releases: vec![
                "https://mirrors.geekpie.club/immortalwrt/releases/{version}".to_string(),
                "https://downloads.immortalwrt.org/releases/{version}".to_string(),
                "https://mirror.nju.edu.cn/immortalwrt/releases/{version}".to_string(),
            ],
            // Snapshots move fast; prefer the origin over mirrors that may lag.
            snapshots: vec![
                "https://downloads.immortalwrt.org/releases/{version}".to_string(),
                "https://mirrors.geekpie.club/immortalwrt/releases/{version}".to_string(),
            ],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mirrors: MirrorTemplates::default(),
            probe_timeout_secs: 10,
            fetch_timeout_secs: 15,
            concurrency: 8,
            overrides: default_overrides(),
        }
    }
}

fn default_overrides() -> Vec<ArchOverride> {
    [
        ("be", "mips_24kc"),
        ("le", "mipsel_24kc"),
        ("be64", "mips64_mips64r2"),
        ("le64", "mips64el_mips64r2"),
    ]
    .into_iter()
    .filter_map(|(subtarget, arch)| {
        Some(ArchOverride {
            target: TargetName::new("malta").ok()?,
            subtarget: SubtargetName::new(subtarget).ok()?,
            archs: vec![ArchName::new(arch).ok()?],
        })
    })
    .collect()
}

impl Config {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot drive a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (channel, templates) in [
            ("releases", &self.mirrors.releases),
            ("snapshots", &self.mirrors.snapshots),
        ] {
            if templates.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "mirrors.{channel} must list at least one mirror"
                )));
            }
            if let Some(bad) = templates
                .iter()
                .find(|t| !(t.starts_with("http://") || t.starts_with("https://")))
            {
                return Err(ConfigError::Invalid(format!(
                    "mirror '{bad}' must be an http(s) URL"
                )));
            }
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.probe_timeout_secs == 0 || self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be at least 1 second".to_string(),
            ));
        }
        if let Some(o) = self.overrides.iter().find(|o| o.archs.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "override for {}/{} lists no architectures",
                o.target, o.subtarget
            )));
        }
        Ok(())
    }

    /// Candidate endpoints for `release`, most preferred first.
    pub fn mirror_endpoints(&self, release: &ReleaseIdentifier) -> Vec<MirrorEndpoint> {
        let templates = if release.is_snapshot() {
            &self.mirrors.snapshots
        } else {
            &self.mirrors.releases
        };
        templates
            .iter()
            .map(|t| MirrorEndpoint::new(&t.replace(VERSION_PLACEHOLDER, release.as_str())))
            .collect()
    }

    /// Reachability probe timeout.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Per-request fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
