//! Matrix assembly: walk targets and subtargets, resolve architectures, and
//! collect a deduplicated [`BuildMatrix`].

use std::collections::{BTreeMap, HashSet};

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{debug, info, warn};
use wrtmx_schema::{BuildMatrix, MatrixEntry, ReleaseIdentifier, SubtargetName, TargetName};

use crate::USER_AGENT;
use crate::arch::{ArchResolver, ArchSource, OverrideTable};
use crate::config::Config;
use crate::error::ResolveError;
use crate::listing::ListingFetcher;
use crate::mirror::select_mirror;
use crate::upstream::Upstream;

/// Drives listing and resolution over the whole target space of one mirror.
#[derive(Debug)]
pub struct MatrixAssembler {
    listing: ListingFetcher,
    resolver: ArchResolver,
    concurrency: usize,
}

impl MatrixAssembler {
    /// `concurrency` bounds in-flight listings and resolutions (minimum 1).
    pub fn new(listing: ListingFetcher, resolver: ArchResolver, concurrency: usize) -> Self {
        Self {
            listing,
            resolver,
            concurrency: concurrency.max(1),
        }
    }

    /// Build the matrix. Fails if the mirror lists no targets or if no entry
    /// survives traversal.
    pub async fn assemble(&self) -> Result<BuildMatrix, ResolveError> {
        let mirror = self.listing.upstream().mirror().url().to_string();

        let targets = self.listing.list_targets().await;
        if targets.is_empty() {
            return Err(ResolveError::NoTargets { mirror });
        }
        info!(count = targets.len(), "discovered targets");

        // Ordered buffering keeps output in discovery order.
        let listings: Vec<(TargetName, Vec<SubtargetName>)> = stream::iter(targets)
            .map(|target| async move {
                let subtargets = self.listing.list_subtargets(&target).await;
                (target, subtargets)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut pairs = Vec::new();
        for (target, subtargets) in listings {
            if subtargets.is_empty() {
                warn!(%target, "target has no subtargets, skipping");
                continue;
            }
            pairs.extend(subtargets.into_iter().map(|s| (target.clone(), s)));
        }
        info!(count = pairs.len(), "discovered subtargets");

        let mut resolutions = stream::iter(pairs)
            .map(|(target, subtarget)| async move {
                let resolution = self.resolver.resolve(&target, &subtarget).await;
                (target, subtarget, resolution)
            })
            .buffered(self.concurrency);

        let mut seen = HashSet::new();
        let mut include = Vec::new();
        let mut by_source: BTreeMap<ArchSource, usize> = BTreeMap::new();

        while let Some((target, subtarget, resolution)) = resolutions.next().await {
            *by_source.entry(resolution.source).or_default() += 1;
            for arch in resolution.archs {
                let entry = MatrixEntry::new(target.clone(), subtarget.clone(), arch);
                if seen.insert(entry.key()) {
                    include.push(entry);
                }
            }
        }

        if include.is_empty() {
            return Err(ResolveError::EmptyMatrix { mirror });
        }

        let sources = by_source
            .iter()
            .map(|(source, n)| format!("{source}={n}"))
            .collect::<Vec<_>>()
            .join(" ");
        info!(entries = include.len(), %sources, "assembled build matrix");

        let matrix = BuildMatrix { include };
        let unresolved = matrix.iter().filter(|e| e.pkgarch.is_unknown()).count();
        if unresolved > 0 {
            warn!(unresolved, "some subtargets have no known package architecture");
        }
        Ok(matrix)
    }
}

/// Resolve the build matrix for `release`: pick a mirror, then enumerate it.
pub async fn resolve_matrix(
    config: &Config,
    release: &ReleaseIdentifier,
) -> Result<BuildMatrix, ResolveError> {
    let client = Client::builder().user_agent(USER_AGENT).build()?;

    let candidates = config.mirror_endpoints(release);
    let mirror = select_mirror(&client, release, &candidates, config.probe_timeout()).await?;

    let upstream = Upstream::new(client, mirror, config.fetch_timeout());
    let listing = ListingFetcher::load(upstream.clone()).await;
    let overrides = OverrideTable::from(config.overrides.as_slice());
    let resolver = ArchResolver::standard(&upstream, &listing, overrides);
    let tiers = resolver
        .sources()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    debug!(%tiers, "architecture tiers");

    MatrixAssembler::new(listing, resolver, config.concurrency)
        .assemble()
        .await
}
