//! Child enumeration over the two listing styles a mirror may offer.
//!
//! A structured `.targets.json` catalog is authoritative when the mirror
//! serves one. Otherwise children are scraped from rendered directory pages.
//! Every listing call degrades to an empty result on failure; deciding
//! whether emptiness is fatal is the caller's business.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use wrtmx_schema::{ArchName, SubtargetName, TargetName};

use crate::layout;
use crate::upstream::Upstream;

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s[^>]*?href\s*=\s*["']([^"']*)["']"#).expect("anchor regex is valid")
});

/// Anchor targets in document order.
pub fn scan_anchors(html: &str) -> Vec<&str> {
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Reduce an anchor target to a mirror-relative child, or `None` for
/// navigation links (parent directory, sort queries, absolute links).
fn relative_child(href: &str) -> Option<&str> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('?')
        || href.starts_with('#')
        || href.starts_with('/')
        || href.contains("://")
        || href.starts_with("mailto:")
    {
        return None;
    }
    let href = href.strip_prefix("./").unwrap_or(href);
    let href = href.split(['?', '#']).next().unwrap_or_default();
    if href.is_empty() || href == ".." || href.starts_with("../") {
        return None;
    }
    Some(href)
}

/// Percent-decode a listing entry; entries that do not decode to UTF-8 are
/// dropped.
fn decode(raw: &str) -> Option<String> {
    match percent_decode_str(raw).decode_utf8() {
        Ok(name) => Some(name.into_owned()),
        Err(e) => {
            warn!(entry = raw, error = %e, "skipping undecodable listing entry");
            None
        }
    }
}

fn dedup_in_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Directory children of a rendered listing, without trailing separators.
pub fn child_directories(html: &str) -> Vec<String> {
    dedup_in_order(
        scan_anchors(html)
            .into_iter()
            .filter_map(relative_child)
            .filter_map(|href| href.strip_suffix('/'))
            .filter_map(|name| decode(name.trim_end_matches('/')))
            .filter(|name| {
                let ok = !name.is_empty() && !name.contains('/');
                if !ok {
                    warn!(entry = %name, "skipping malformed directory entry");
                }
                ok
            }),
    )
}

/// File children of a rendered listing.
pub fn child_files(html: &str) -> Vec<String> {
    dedup_in_order(
        scan_anchors(html)
            .into_iter()
            .filter_map(relative_child)
            .filter(|href| !href.ends_with('/') && !href.contains('/'))
            .filter_map(decode)
            .filter(|name| !name.contains('/')),
    )
}

/// One `target/subtarget` row of the structured listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Target of the row.
    pub target: TargetName,
    /// Subtarget of the row.
    pub subtarget: SubtargetName,
    /// Package architecture recorded for the pair, if any.
    pub pkgarch: Option<ArchName>,
}

/// The structured target listing (`.targets.json`).
///
/// Accepts both composite keys (`{"ath79/generic": "mips_24kc"}`) and nested
/// keys (`{"ath79": {"generic": "mips_24kc"}}`). Rows that do not name a
/// valid pair are skipped with a warning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetCatalog {
    entries: Vec<CatalogEntry>,
}

impl TargetCatalog {
    /// Parse a catalog document.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let root: Map<String, Value> = serde_json::from_str(text)?;
        let mut entries = Vec::new();

        for (key, value) in &root {
            if let Value::Object(nested) = value {
                if key.contains('/') {
                    warn!(key = %key, "skipping catalog entry with nested composite key");
                    continue;
                }
                for (sub, arch) in nested {
                    push_entry(&mut entries, key, sub, arch);
                }
                continue;
            }

            let mut parts = key.split('/');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(target), Some(subtarget), None) => {
                    push_entry(&mut entries, target, subtarget, value);
                }
                _ => warn!(key = %key, "skipping invalid catalog entry"),
            }
        }

        Ok(Self { entries })
    }

    /// All rows in document order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Whether the catalog has no usable rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct targets in document order.
    pub fn targets(&self) -> Vec<TargetName> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|e| seen.insert(&e.target))
            .map(|e| e.target.clone())
            .collect()
    }

    /// Distinct subtargets of `target` in document order.
    pub fn subtargets(&self, target: &TargetName) -> Vec<SubtargetName> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|e| &e.target == target)
            .filter(|e| seen.insert(&e.subtarget))
            .map(|e| e.subtarget.clone())
            .collect()
    }

    /// The architecture recorded for a pair, if the catalog has one.
    pub fn arch(&self, target: &TargetName, subtarget: &SubtargetName) -> Option<&ArchName> {
        self.entries
            .iter()
            .filter(|e| &e.target == target && &e.subtarget == subtarget)
            .find_map(|e| e.pkgarch.as_ref())
    }
}

fn push_entry(entries: &mut Vec<CatalogEntry>, target: &str, subtarget: &str, arch: &Value) {
    let (Ok(target), Ok(subtarget)) = (TargetName::new(target), SubtargetName::new(subtarget))
    else {
        warn!(key = %format!("{target}/{subtarget}"), "skipping invalid catalog entry");
        return;
    };
    let pkgarch = arch.as_str().and_then(|a| ArchName::new(a).ok());
    entries.push(CatalogEntry {
        target,
        subtarget,
        pkgarch,
    });
}

/// Lists targets, subtargets, and package files on the active mirror.
#[derive(Debug, Clone)]
pub struct ListingFetcher {
    upstream: Upstream,
    catalog: Option<Arc<TargetCatalog>>,
}

impl ListingFetcher {
    /// Bind to `upstream`, loading the structured catalog if the mirror has one.
    pub async fn load(upstream: Upstream) -> Self {
        let catalog = match upstream.get_text(layout::CATALOG).await {
            Ok(text) => match TargetCatalog::parse(&text) {
                Ok(catalog) if !catalog.is_empty() => {
                    info!(
                        entries = catalog.entries().len(),
                        "using structured target listing"
                    );
                    Some(catalog)
                }
                Ok(_) => {
                    debug!("structured target listing is empty, scraping instead");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "malformed structured target listing, scraping instead");
                    None
                }
            },
            Err(e) => {
                debug!(error = %e, "no structured target listing, scraping instead");
                None
            }
        };
        Self::with_catalog(upstream, catalog)
    }

    /// Bind to `upstream` with an already-known catalog (or none).
    pub fn with_catalog(upstream: Upstream, catalog: Option<TargetCatalog>) -> Self {
        Self {
            upstream,
            catalog: catalog.map(Arc::new),
        }
    }

    /// The structured catalog, when the mirror provided one.
    pub fn catalog(&self) -> Option<&Arc<TargetCatalog>> {
        self.catalog.as_ref()
    }

    /// The mirror this fetcher lists.
    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    async fn page(&self, path: &str) -> Option<String> {
        match self.upstream.get_text(path).await {
            Ok(html) => Some(html),
            Err(e) => {
                debug!(path, error = %e, "listing fetch failed");
                None
            }
        }
    }

    /// Directory children of a rendered listing; empty on any failure.
    pub async fn list_children(&self, path: &str) -> Vec<String> {
        self.page(path)
            .await
            .map(|html| child_directories(&html))
            .unwrap_or_default()
    }

    /// File children of a rendered listing; empty on any failure.
    pub async fn list_files(&self, path: &str) -> Vec<String> {
        self.page(path)
            .await
            .map(|html| child_files(&html))
            .unwrap_or_default()
    }

    /// All targets on the mirror.
    pub async fn list_targets(&self) -> Vec<TargetName> {
        if let Some(catalog) = &self.catalog {
            return catalog.targets();
        }
        named(self.list_children(layout::TARGETS).await)
    }

    /// All subtargets of `target`.
    pub async fn list_subtargets(&self, target: &TargetName) -> Vec<SubtargetName> {
        if let Some(catalog) = &self.catalog {
            return catalog.subtargets(target);
        }
        named(self.list_children(&layout::target_dir(target)).await)
    }
}

fn named<N: std::str::FromStr<Err = wrtmx_schema::NameError>>(raw: Vec<String>) -> Vec<N> {
    raw.into_iter()
        .filter_map(|s| match s.parse() {
            Ok(n) => Some(n),
            Err(e) => {
                warn!(entry = %s, error = %e, "skipping malformed listing entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::ActiveMirror;
    use mockito::Server;
    use reqwest::Client;
    use std::time::Duration;

    const INDEX_PAGE: &str = r#"<html><head><title>Index of /releases/23.05.4/targets/</title></head>
<body><h1>Index of /releases/23.05.4/targets/</h1><hr><pre>
<a href="../">../</a>
<a href="?C=N;O=D">Name</a>
<a href="/releases/">releases</a>
<a href="https://example.org/">elsewhere</a>
<a href="armsr/">armsr/</a>                19-Apr-2024 10:00    -
<a href="./ath79/">ath79/</a>              19-Apr-2024 10:00    -
<a href='x86/'>x86/</a>                    19-Apr-2024 10:00    -
<a href="armsr/">armsr/</a>
<a href="a/b/">nested</a>
<a href="sha256sums">sha256sums</a>
</pre><hr></body></html>"#;

    fn fetcher(url: &str, catalog: Option<TargetCatalog>) -> ListingFetcher {
        let upstream = Upstream::new(
            Client::new(),
            ActiveMirror::for_tests(url),
            Duration::from_secs(5),
        );
        ListingFetcher::with_catalog(upstream, catalog)
    }

    #[test]
    fn test_child_directories_skips_navigation_and_dups() {
        assert_eq!(child_directories(INDEX_PAGE), vec!["armsr", "ath79", "x86"]);
    }

    #[test]
    fn test_entries_are_percent_decoded() {
        let html = r#"<a href="../">../</a>
<a href="foo%2Bbar/">foo+bar/</a>
<a href="foo+bar/">dup</a>
<a href="a%2Fb/">encoded separator</a>
<a href="bad%FF/">not utf-8</a>
<a href="libstdcpp6_13.3.0%2Bgit-r4_x86_64.ipk">libstdcpp6</a>"#;
        assert_eq!(child_directories(html), vec!["foo+bar"]);
        assert_eq!(
            child_files(html),
            vec!["libstdcpp6_13.3.0+git-r4_x86_64.ipk"]
        );
    }

    #[test]
    fn test_child_files() {
        let html = r#"<a href="../">../</a>
<a href="base-files_1565-r24106_aarch64_cortex-a53.ipk">base-files</a>
<a href="Packages.gz">Packages.gz</a>
<a href="kmods/">kmods/</a>
<a href="base-files_1565-r24106_aarch64_cortex-a53.ipk">dup</a>"#;
        assert_eq!(
            child_files(html),
            vec![
                "base-files_1565-r24106_aarch64_cortex-a53.ipk",
                "Packages.gz"
            ]
        );
    }

    #[test]
    fn test_catalog_composite_and_nested_keys() {
        let catalog = TargetCatalog::parse(
            r#"{
                "ath79/generic": "mips_24kc",
                "ath79/nand": "mips_24kc",
                "bogus": "x",
                "a/b/c": "x",
                "x86": {"64": "x86_64", "generic": "i386_pentium4"},
                "mediatek/filogic": null
            }"#,
        )
        .unwrap();

        let targets = catalog.targets();
        let targets: Vec<&str> = targets.iter().map(TargetName::as_str).collect();
        assert_eq!(targets, vec!["ath79", "x86", "mediatek"]);

        let x86 = TargetName::new("x86").unwrap();
        let subs: Vec<String> = catalog
            .subtargets(&x86)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(subs, vec!["64", "generic"]);

        let s64 = SubtargetName::new("64").unwrap();
        assert_eq!(catalog.arch(&x86, &s64).unwrap().as_str(), "x86_64");

        let mediatek = TargetName::new("mediatek").unwrap();
        let filogic = SubtargetName::new("filogic").unwrap();
        assert!(catalog.arch(&mediatek, &filogic).is_none());
    }

    #[test]
    fn test_catalog_rejects_non_objects() {
        assert!(TargetCatalog::parse("[1,2,3]").is_err());
        assert!(TargetCatalog::parse("{}").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scrapes_targets_and_subtargets() {
        let mut server = Server::new_async().await;
        let _targets = server
            .mock("GET", "/targets/")
            .with_status(200)
            .with_body(INDEX_PAGE)
            .create_async()
            .await;
        let _ath79 = server
            .mock("GET", "/targets/ath79/")
            .with_status(200)
            .with_body(r#"<a href="../">../</a><a href="generic/">generic/</a><a href="nand/">nand/</a>"#)
            .create_async()
            .await;

        let listing = fetcher(&server.url(), None);
        let targets = listing.list_targets().await;
        assert_eq!(targets.len(), 3);

        let subs = listing.list_subtargets(&targets[1]).await;
        let subs: Vec<&str> = subs.iter().map(SubtargetName::as_str).collect();
        assert_eq!(subs, vec!["generic", "nand"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_empty_listing() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/targets/")
            .with_status(500)
            .create_async()
            .await;

        let listing = fetcher(&server.url(), None);
        assert!(listing.list_targets().await.is_empty());
        assert!(
            listing
                .list_subtargets(&TargetName::new("x86").unwrap())
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_catalog_is_preferred_over_scraping() {
        let mut server = Server::new_async().await;
        let _catalog = server
            .mock("GET", "/.targets.json")
            .with_status(200)
            .with_body(r#"{"ramips/mt7621": "mipsel_24kc"}"#)
            .create_async()
            .await;
        let scrape = server
            .mock("GET", "/targets/")
            .with_status(200)
            .with_body(INDEX_PAGE)
            .expect(0)
            .create_async()
            .await;

        let upstream = Upstream::new(
            Client::new(),
            ActiveMirror::for_tests(&server.url()),
            Duration::from_secs(5),
        );
        let listing = ListingFetcher::load(upstream).await;
        assert!(listing.catalog().is_some());

        let targets = listing.list_targets().await;
        assert_eq!(targets, vec![TargetName::new("ramips").unwrap()]);
        scrape.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_catalog_falls_back_to_scraping() {
        let mut server = Server::new_async().await;
        let _catalog = server
            .mock("GET", "/.targets.json")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;
        let _targets = server
            .mock("GET", "/targets/")
            .with_status(200)
            .with_body(INDEX_PAGE)
            .create_async()
            .await;

        let upstream = Upstream::new(
            Client::new(),
            ActiveMirror::for_tests(&server.url()),
            Duration::from_secs(5),
        );
        let listing = ListingFetcher::load(upstream).await;
        assert!(listing.catalog().is_none());
        assert_eq!(listing.list_targets().await.len(), 3);
    }
}
