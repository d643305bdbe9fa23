use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use wrtmx_schema::{ArchName, SubtargetName, TargetName};

use super::filename::infer_arch;
use super::{ArchSource, ArchTier};
use crate::config::ArchOverride;
use crate::layout;
use crate::listing::{ListingFetcher, TargetCatalog};
use crate::upstream::Upstream;

/// Fixed architectures keyed by (target, subtarget).
#[derive(Debug, Clone, Default)]
pub struct OverrideTable(HashMap<(TargetName, SubtargetName), Vec<ArchName>>);

impl OverrideTable {
    /// Architectures for a pair, if overridden.
    pub fn get(&self, target: &TargetName, subtarget: &SubtargetName) -> Option<&[ArchName]> {
        self.0
            .get(&(target.clone(), subtarget.clone()))
            .map(Vec::as_slice)
    }

    /// Number of overridden pairs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[ArchOverride]> for OverrideTable {
    /// Later entries for the same pair replace earlier ones.
    fn from(overrides: &[ArchOverride]) -> Self {
        Self(
            overrides
                .iter()
                .map(|o| ((o.target.clone(), o.subtarget.clone()), o.archs.clone()))
                .collect(),
        )
    }
}

/// Tier 1: the static override table. No network access.
#[derive(Debug)]
pub struct OverrideTier {
    table: OverrideTable,
}

impl OverrideTier {
    /// Wrap a table.
    pub fn new(table: OverrideTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl ArchTier for OverrideTier {
    fn source(&self) -> ArchSource {
        ArchSource::Override
    }

    async fn resolve(
        &self,
        target: &TargetName,
        subtarget: &SubtargetName,
    ) -> Option<Vec<ArchName>> {
        self.table.get(target, subtarget).map(<[ArchName]>::to_vec)
    }
}

/// The architecture recorded in the structured target listing.
#[derive(Debug)]
pub struct CatalogTier {
    catalog: Arc<TargetCatalog>,
}

impl CatalogTier {
    /// Wrap a loaded catalog.
    pub fn new(catalog: Arc<TargetCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl ArchTier for CatalogTier {
    fn source(&self) -> ArchSource {
        ArchSource::Catalog
    }

    async fn resolve(
        &self,
        target: &TargetName,
        subtarget: &SubtargetName,
    ) -> Option<Vec<ArchName>> {
        self.catalog
            .arch(target, subtarget)
            .map(|arch| vec![arch.clone()])
    }
}

#[derive(Deserialize)]
struct PackageIndexDoc {
    architecture: Option<String>,
}

/// Tier 2: `packages/index.json` and its `architecture` field.
#[derive(Debug)]
pub struct PackageIndexTier {
    upstream: Upstream,
}

impl PackageIndexTier {
    /// Fetch from `upstream`.
    pub fn new(upstream: Upstream) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl ArchTier for PackageIndexTier {
    fn source(&self) -> ArchSource {
        ArchSource::PackageIndex
    }

    async fn resolve(
        &self,
        target: &TargetName,
        subtarget: &SubtargetName,
    ) -> Option<Vec<ArchName>> {
        let path = layout::package_index(target, subtarget);
        let doc: PackageIndexDoc = match self.upstream.get_json(&path).await {
            Ok(doc) => doc,
            Err(e) => {
                debug!(path = %path, error = %e, "package index unavailable");
                return None;
            }
        };
        let arch = ArchName::new(&doc.architecture?).ok()?;
        Some(vec![arch])
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
struct ProfilesDoc {
    arch_packages: Option<OneOrMany>,
}

/// Tier 3: `profiles.json` and its `arch_packages` field (string or list).
#[derive(Debug)]
pub struct ProfileTier {
    upstream: Upstream,
}

impl ProfileTier {
    /// Fetch from `upstream`.
    pub fn new(upstream: Upstream) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl ArchTier for ProfileTier {
    fn source(&self) -> ArchSource {
        ArchSource::Profiles
    }

    async fn resolve(
        &self,
        target: &TargetName,
        subtarget: &SubtargetName,
    ) -> Option<Vec<ArchName>> {
        let path = layout::profiles(target, subtarget);
        let doc: ProfilesDoc = match self.upstream.get_json(&path).await {
            Ok(doc) => doc,
            Err(e) => {
                debug!(path = %path, error = %e, "profiles unavailable");
                return None;
            }
        };
        let raw = match doc.arch_packages? {
            OneOrMany::One(arch) => vec![arch],
            OneOrMany::Many(archs) => archs,
        };
        let archs: Vec<ArchName> = raw.iter().filter_map(|a| ArchName::new(a).ok()).collect();
        (!archs.is_empty()).then_some(archs)
    }
}

/// Tier 4: infer from the filenames in the subtarget's package directory.
#[derive(Debug)]
pub struct FilenameTier {
    listing: ListingFetcher,
}

impl FilenameTier {
    /// List through `listing`.
    pub fn new(listing: ListingFetcher) -> Self {
        Self { listing }
    }
}

#[async_trait]
impl ArchTier for FilenameTier {
    fn source(&self) -> ArchSource {
        ArchSource::Filename
    }

    async fn resolve(
        &self,
        target: &TargetName,
        subtarget: &SubtargetName,
    ) -> Option<Vec<ArchName>> {
        let files = self
            .listing
            .list_files(&layout::packages_dir(target, subtarget))
            .await;
        let arch = infer_arch(files.iter().map(String::as_str))?;
        ArchName::new(&arch).ok().map(|a| vec![a])
    }
}
