use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{ResolverBackend, ResolverConfig};
use crate::process::{ProcessRunner, SystemProcessRunner};
use crate::resolver::{IndexResolver, NixResolver, PackageResolver};

/// Everything a command touches outside the process.
pub trait Effects: Send + Sync {
    fn resolver(&self) -> &dyn PackageResolver;
    fn process(&self) -> &dyn ProcessRunner;
}

pub struct SystemEffects {
    resolver: Arc<dyn PackageResolver>,
    process: Arc<SystemProcessRunner>,
}

impl SystemEffects {
    #[must_use]
    pub fn from_config(config: &ResolverConfig, cwd: PathBuf) -> Self {
        let process = Arc::new(SystemProcessRunner);
        let resolver: Arc<dyn PackageResolver> = match &config.backend {
            ResolverBackend::Nix => Arc::new(NixResolver::new(
                config.nix_bin.clone(),
                cwd,
                process.clone(),
            )),
            ResolverBackend::Index(path) => Arc::new(IndexResolver::new(path.clone())),
        };
        Self { resolver, process }
    }
}

impl Effects for SystemEffects {
    fn resolver(&self) -> &dyn PackageResolver {
        self.resolver.as_ref()
    }

    fn process(&self) -> &dyn ProcessRunner {
        self.process.as_ref()
    }
}

pub type SharedEffects = Arc<dyn Effects>;
