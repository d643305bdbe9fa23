//! Package architecture resolution for one (target, subtarget) pair.
//!
//! Resolution walks an ordered list of [`ArchTier`]s and stops at the first
//! one that yields a non-empty answer. Tiers never fail: a fetch or parse
//! error inside a tier is a miss, and the walk moves on. When every tier
//! misses the pair resolves to `["unknown"]` so one bad subtarget cannot
//! abort the run.

/// Package-filename architecture inference.
pub mod filename;
/// The standard tiers.
pub mod tiers;

use async_trait::async_trait;
use tracing::debug;
use wrtmx_schema::{ArchName, SubtargetName, TargetName};

use crate::listing::ListingFetcher;
use crate::upstream::Upstream;

pub use tiers::{
    CatalogTier, FilenameTier, OverrideTable, OverrideTier, PackageIndexTier, ProfileTier,
};

/// Which tier produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArchSource {
    /// Static override table.
    Override,
    /// Structured target listing.
    Catalog,
    /// Per-subtarget package index document.
    PackageIndex,
    /// Per-subtarget device profile document.
    Profiles,
    /// Inferred from package filenames.
    Filename,
    /// No tier matched.
    Exhausted,
}

impl ArchSource {
    /// Short label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Catalog => "catalog",
            Self::PackageIndex => "package-index",
            Self::Profiles => "profiles",
            Self::Filename => "filename",
            Self::Exhausted => "exhausted",
        }
    }
}

impl std::fmt::Display for ArchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the resolution cascade.
#[async_trait]
pub trait ArchTier: Send + Sync + std::fmt::Debug {
    /// Label recorded when this tier wins.
    fn source(&self) -> ArchSource;

    /// Architectures for the pair, or `None` if this tier has no answer.
    async fn resolve(
        &self,
        target: &TargetName,
        subtarget: &SubtargetName,
    ) -> Option<Vec<ArchName>>;
}

/// Outcome of resolving one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Never empty.
    pub archs: Vec<ArchName>,
    /// Tier that produced `archs`.
    pub source: ArchSource,
}

/// Tries tiers in precedence order.
#[derive(Debug)]
pub struct ArchResolver {
    tiers: Vec<Box<dyn ArchTier>>,
}

impl ArchResolver {
    /// Resolver over an explicit tier list, highest precedence first.
    pub fn new(tiers: Vec<Box<dyn ArchTier>>) -> Self {
        Self { tiers }
    }

    /// The standard cascade: overrides, catalog (when loaded), package index,
    /// profiles, then filename inference.
    pub fn standard(
        upstream: &Upstream,
        listing: &ListingFetcher,
        overrides: OverrideTable,
    ) -> Self {
        let mut tiers: Vec<Box<dyn ArchTier>> = vec![Box::new(OverrideTier::new(overrides))];
        if let Some(catalog) = listing.catalog() {
            tiers.push(Box::new(CatalogTier::new(catalog.clone())));
        }
        tiers.push(Box::new(PackageIndexTier::new(upstream.clone())));
        tiers.push(Box::new(ProfileTier::new(upstream.clone())));
        tiers.push(Box::new(FilenameTier::new(listing.clone())));
        Self::new(tiers)
    }

    /// Sources of the configured tiers, in order.
    pub fn sources(&self) -> Vec<ArchSource> {
        self.tiers.iter().map(|t| t.source()).collect()
    }

    /// Resolve a pair. Always returns at least one architecture.
    pub async fn resolve(&self, target: &TargetName, subtarget: &SubtargetName) -> Resolution {
        for tier in &self.tiers {
            match tier.resolve(target, subtarget).await {
                Some(archs) if !archs.is_empty() => {
                    debug!(%target, %subtarget, source = %tier.source(), ?archs, "resolved");
                    return Resolution {
                        archs,
                        source: tier.source(),
                    };
                }
                _ => debug!(%target, %subtarget, source = %tier.source(), "tier missed"),
            }
        }

        debug!(%target, %subtarget, "all tiers exhausted");
        Resolution {
            archs: vec![ArchName::unknown()],
            source: ArchSource::Exhausted,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A tier with a canned answer for every pair.
    #[derive(Debug)]
    pub(crate) struct FixedTier {
        pub(crate) source: ArchSource,
        pub(crate) archs: Option<Vec<&'static str>>,
    }

    #[async_trait]
    impl ArchTier for FixedTier {
        fn source(&self) -> ArchSource {
            self.source
        }

        async fn resolve(&self, _: &TargetName, _: &SubtargetName) -> Option<Vec<ArchName>> {
            self.archs
                .as_ref()
                .map(|a| a.iter().map(|s| ArchName::new(s).unwrap()).collect())
        }
    }
}
