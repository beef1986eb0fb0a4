//! The package-manager seam: pinning a source to a snapshot and looking up
//! packages inside it.

mod index;
mod nix;

use std::path::PathBuf;

use dx_domain::{PackageName, PackageSource, TargetPlatform};
use serde::Serialize;
use thiserror::Error;

pub use index::IndexResolver;
pub use nix::NixResolver;

/// A source pinned to an immutable snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PinnedSnapshot {
    /// Locator as written in the descriptor.
    pub locator: String,
    /// Reference the collaborator uses for lookups (may be more precise than `locator`).
    pub reference: String,
    pub revision: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackageLookup {
    Found(PathBuf),
    Missing,
    Unsupported,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{locator} could not be fetched: {reason}")]
    Unresolved { locator: String, reason: String },
    #[error("{backend} is unavailable: {reason}")]
    Unavailable {
        backend: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// The external package manager, as seen by the loader.
pub trait PackageResolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Pins `source` to the snapshot its locator names.
    ///
    /// # Errors
    /// Returns [`ResolveError::Unresolved`] when the repository or revision cannot be fetched.
    fn resolve_source(&self, source: &PackageSource) -> Result<PinnedSnapshot, ResolveError>;

    /// Looks `name` up in a pinned snapshot for `platform`.
    ///
    /// # Errors
    /// Returns an error when the collaborator fails for reasons other than the
    /// package being absent or unsupported.
    fn lookup(
        &self,
        snapshot: &PinnedSnapshot,
        name: &PackageName,
        platform: TargetPlatform,
    ) -> Result<PackageLookup, ResolveError>;
}
