use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use dx_domain::{PackageName, PackageSource, TargetPlatform};
use serde::Deserialize;
use tracing::debug;

use super::{PackageLookup, PackageResolver, PinnedSnapshot, ResolveError};

/// Snapshot index keyed by locator:
/// `{"sources": {"<locator>": {"revision": "..", "packages": {"<name>": {"<platform>": "<path>"}}}}}`
#[derive(Debug, Default, Deserialize)]
struct SnapshotIndex {
    #[serde(default)]
    sources: BTreeMap<String, IndexedSnapshot>,
}

#[derive(Debug, Deserialize)]
struct IndexedSnapshot {
    revision: String,
    #[serde(default)]
    packages: BTreeMap<String, BTreeMap<String, PathBuf>>,
}

/// Resolves against a pre-evaluated JSON snapshot index instead of invoking
/// the package manager.
pub struct IndexResolver {
    path: PathBuf,
    loaded: OnceLock<SnapshotIndex>,
}

impl IndexResolver {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn index(&self) -> Result<&SnapshotIndex, ResolveError> {
        if let Some(index) = self.loaded.get() {
            return Ok(index);
        }
        let contents = fs::read_to_string(&self.path).map_err(|err| ResolveError::Unavailable {
            backend: "snapshot index",
            reason: format!("{}: {err}", self.path.display()),
        })?;
        let parsed: SnapshotIndex =
            serde_json::from_str(&contents).map_err(|err| ResolveError::Unavailable {
                backend: "snapshot index",
                reason: format!("{} is not a valid snapshot index: {err}", self.path.display()),
            })?;
        debug!(
            path = %self.path.display(),
            sources = parsed.sources.len(),
            "loaded snapshot index"
        );
        Ok(self.loaded.get_or_init(|| parsed))
    }

    fn snapshot(&self, locator: &str) -> Result<&IndexedSnapshot, ResolveError> {
        self.index()?
            .sources
            .get(locator)
            .ok_or_else(|| ResolveError::Unresolved {
                locator: locator.to_string(),
                reason: "revision not present in the snapshot index".to_string(),
            })
    }
}

impl PackageResolver for IndexResolver {
    fn name(&self) -> &'static str {
        "index"
    }

    fn resolve_source(&self, source: &PackageSource) -> Result<PinnedSnapshot, ResolveError> {
        let locator = source.locator.to_string();
        let snapshot = self.snapshot(&locator)?;
        Ok(PinnedSnapshot {
            reference: locator.clone(),
            locator,
            revision: snapshot.revision.clone(),
        })
    }

    fn lookup(
        &self,
        snapshot: &PinnedSnapshot,
        name: &PackageName,
        platform: TargetPlatform,
    ) -> Result<PackageLookup, ResolveError> {
        let indexed = self.snapshot(&snapshot.reference)?;
        let Some(builds) = indexed.packages.get(name.as_str()) else {
            return Ok(PackageLookup::Missing);
        };
        Ok(match builds.get(platform.as_str()) {
            Some(path) => PackageLookup::Found(path.clone()),
            None => PackageLookup::Unsupported,
        })
    }
}
