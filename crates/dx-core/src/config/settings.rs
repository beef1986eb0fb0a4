use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::outcome::UserError;

pub const DESCRIPTOR_ENV: &str = "DX_DESCRIPTOR";
pub const SYSTEM_ENV: &str = "DX_SYSTEM";
pub const RESOLVER_ENV: &str = "DX_RESOLVER";
pub const SNAPSHOT_INDEX_ENV: &str = "DX_SNAPSHOT_INDEX";
pub const NIX_BIN_ENV: &str = "DX_NIX_BIN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
    pub descriptor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug)]
pub struct Config {
    pub(crate) descriptor: DescriptorConfig,
    pub(crate) platform: PlatformConfig,
    pub(crate) resolver: ResolverConfig,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    ///
    /// # Errors
    /// Returns a [`UserError`] when a `DX_*` variable holds an unusable value.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> anyhow::Result<Self> {
        let index = snapshot.var(SNAPSHOT_INDEX_ENV).map(PathBuf::from);
        let backend = match (snapshot.var(RESOLVER_ENV), index) {
            (None | Some("index"), Some(path)) => ResolverBackend::Index(path),
            (None | Some("nix"), None) => ResolverBackend::Nix,
            (Some("nix"), Some(path)) => {
                debug!(
                    index = %path.display(),
                    "DX_RESOLVER=nix overrides DX_SNAPSHOT_INDEX"
                );
                ResolverBackend::Nix
            }
            (Some("index"), None) => {
                return Err(UserError::new(
                    "DX_RESOLVER=index requires DX_SNAPSHOT_INDEX",
                    json!({
                        "reason": "invalid_config",
                        "hint": "Point DX_SNAPSHOT_INDEX at a snapshot index JSON file.",
                    }),
                )
                .into())
            }
            (Some(other), _) => {
                return Err(UserError::new(
                    format!("unsupported resolver `{other}`"),
                    json!({
                        "reason": "invalid_config",
                        "hint": "Set DX_RESOLVER to `nix` or `index`.",
                    }),
                )
                .into())
            }
        };
        Ok(Self {
            descriptor: DescriptorConfig {
                path: snapshot.var(DESCRIPTOR_ENV).map(PathBuf::from),
            },
            platform: PlatformConfig {
                system: snapshot.var(SYSTEM_ENV).map(ToOwned::to_owned),
            },
            resolver: ResolverConfig {
                backend,
                nix_bin: snapshot.var(NIX_BIN_ENV).unwrap_or("nix").to_string(),
            },
        })
    }

    #[must_use]
    pub fn descriptor(&self) -> &DescriptorConfig {
        &self.descriptor
    }

    #[must_use]
    pub fn platform(&self) -> &PlatformConfig {
        &self.platform
    }

    #[must_use]
    pub fn resolver(&self) -> &ResolverConfig {
        &self.resolver
    }
}

#[derive(Debug, Clone)]
pub struct DescriptorConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub system: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverBackend {
    Nix,
    Index(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub backend: ResolverBackend,
    pub nix_bin: String,
}
