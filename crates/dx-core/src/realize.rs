use std::collections::BTreeMap;

use dx_domain::{
    DescriptorError, EnvironmentDescriptor, PackageName, PackageSource, ShellSpecification,
    TargetPlatform, ToolRequest,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::resolver::{PackageLookup, PackageResolver, ResolveError};

#[derive(Debug, Error)]
pub enum RealizeError {
    #[error("package source `{input}` ({locator}) could not be resolved: {reason}")]
    UnresolvedSource {
        input: String,
        locator: String,
        reason: String,
    },
    #[error("{} not found in {locator}", join_names(.names))]
    UnknownPackage {
        locator: String,
        names: Vec<PackageName>,
    },
    #[error("no {platform} build in {locator} for {}", join_names(.names))]
    PlatformUnsupported {
        locator: String,
        platform: TargetPlatform,
        names: Vec<PackageName>,
    },
    #[error("{backend} is unavailable: {reason}")]
    ResolverUnavailable {
        backend: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Resolver(anyhow::Error),
}

impl RealizeError {
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            RealizeError::UnresolvedSource { .. } => "unresolved_source",
            RealizeError::UnknownPackage { .. } => "unknown_package",
            RealizeError::PlatformUnsupported { .. } => "platform_unsupported",
            RealizeError::ResolverUnavailable { .. } => "resolver_unavailable",
            RealizeError::Resolver(_) => "resolver_failed",
        }
    }

    fn from_resolve(source: &PackageSource, err: ResolveError) -> Self {
        match err {
            ResolveError::Unresolved { locator, reason } => RealizeError::UnresolvedSource {
                input: source.name.clone(),
                locator,
                reason,
            },
            ResolveError::Unavailable { backend, reason } => {
                RealizeError::ResolverUnavailable { backend, reason }
            }
            ResolveError::Backend(err) => RealizeError::Resolver(err),
        }
    }
}

fn join_names(names: &[PackageName]) -> String {
    names
        .iter()
        .map(PackageName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolves every requested package from `source` for `platform`.
///
/// All-or-nothing: the source is pinned before any lookup, every name is
/// looked up, and any absent or unsupported package fails the whole request.
/// Absent packages are reported in preference to unsupported ones.
///
/// # Errors
/// Returns a [`RealizeError`] describing why no shell could be produced.
pub fn realize(
    resolver: &dyn PackageResolver,
    source: &PackageSource,
    platform: TargetPlatform,
    request: &ToolRequest,
) -> Result<ShellSpecification, RealizeError> {
    debug!(
        resolver = resolver.name(),
        input = %source.name,
        locator = %source.locator,
        %platform,
        tools = request.len(),
        "realizing shell"
    );
    let pinned = resolver
        .resolve_source(source)
        .map_err(|err| RealizeError::from_resolve(source, err))?;

    let mut tools = BTreeMap::new();
    let mut missing = Vec::new();
    let mut unsupported = Vec::new();
    for name in request {
        let lookup = resolver
            .lookup(&pinned, name, platform)
            .map_err(|err| RealizeError::from_resolve(source, err))?;
        debug!(package = %name, ?lookup, "looked up package");
        match lookup {
            PackageLookup::Found(path) => {
                tools.insert(name.clone(), path);
            }
            PackageLookup::Missing => missing.push(name.clone()),
            PackageLookup::Unsupported => unsupported.push(name.clone()),
        }
    }
    if !missing.is_empty() {
        return Err(RealizeError::UnknownPackage {
            locator: pinned.locator,
            names: missing,
        });
    }
    if !unsupported.is_empty() {
        return Err(RealizeError::PlatformUnsupported {
            locator: pinned.locator,
            platform,
            names: unsupported,
        });
    }

    info!(
        revision = %pinned.revision,
        tools = tools.len(),
        "resolved shell"
    );
    Ok(ShellSpecification {
        source: source.name.clone(),
        locator: pinned.locator,
        revision: pinned.revision,
        platform,
        tools,
        env: BTreeMap::new(),
        shell_hook: None,
    })
}

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error(transparent)]
    Realize(#[from] RealizeError),
}

/// Evaluates the descriptor's outputs for `platform` and realizes its dev shell.
///
/// # Errors
/// Fails when the outputs are not defined for `platform` or realization fails.
pub fn realize_descriptor(
    resolver: &dyn PackageResolver,
    descriptor: &EnvironmentDescriptor,
    platform: TargetPlatform,
) -> Result<ShellSpecification, ActivationError> {
    let dev_shell = descriptor.dev_shell_for(platform)?;
    let mut shell = realize(
        resolver,
        descriptor.shell_source(),
        platform,
        &descriptor.tool_request(),
    )?;
    shell.env.clone_from(&dev_shell.env);
    shell.shell_hook.clone_from(&dev_shell.shell_hook);
    Ok(shell)
}
