use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use dx_domain::{current_descriptor, EnvironmentDescriptor, TargetPlatform};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::config::{Config, EnvSnapshot, GlobalOptions};
use crate::effects::{SharedEffects, SystemEffects};
use crate::outcome::UserError;
use crate::process::ProcessRunner;
use crate::resolver::PackageResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandGroup {
    Init,
    Check,
    Realize,
    Env,
    Shell,
}

impl fmt::Display for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandGroup::Init => "init",
            CommandGroup::Check => "check",
            CommandGroup::Realize => "realize",
            CommandGroup::Env => "env",
            CommandGroup::Shell => "shell",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CommandInfo {
    pub group: CommandGroup,
    pub name: &'static str,
}

impl CommandInfo {
    #[must_use]
    pub const fn new(group: CommandGroup, name: &'static str) -> Self {
        Self { group, name }
    }
}

pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    env: EnvSnapshot,
    config: Config,
    cwd: PathBuf,
    descriptor_path: OnceLock<PathBuf>,
    effects: SharedEffects,
}

impl<'a> CommandContext<'a> {
    /// Creates a context backed by the real package manager and processes.
    ///
    /// # Errors
    /// Returns an error if the working directory or configuration cannot be read.
    pub fn new(global: &'a GlobalOptions) -> Result<Self> {
        let env = EnvSnapshot::capture();
        let config = Config::from_snapshot(&env)?;
        let cwd = env::current_dir().context("unable to determine the working directory")?;
        let effects: SharedEffects =
            Arc::new(SystemEffects::from_config(config.resolver(), cwd.clone()));
        Ok(Self::with_effects(global, env, config, cwd, effects))
    }

    pub fn with_effects(
        global: &'a GlobalOptions,
        env: EnvSnapshot,
        config: Config,
        cwd: PathBuf,
        effects: SharedEffects,
    ) -> Self {
        Self {
            global,
            env,
            config,
            cwd,
            descriptor_path: OnceLock::new(),
            effects,
        }
    }

    pub fn resolver(&self) -> &dyn PackageResolver {
        self.effects.resolver()
    }

    pub fn process(&self) -> &dyn ProcessRunner {
        self.effects.process()
    }

    pub fn env(&self) -> &EnvSnapshot {
        &self.env
    }

    pub fn cwd(&self) -> &PathBuf {
        &self.cwd
    }

    /// Path `dx init` writes to: the explicit descriptor path or `./dx.toml`.
    pub fn init_target(&self) -> PathBuf {
        self.explicit_descriptor()
            .unwrap_or_else(|| self.cwd.join(dx_domain::DESCRIPTOR_FILE))
    }

    fn explicit_descriptor(&self) -> Option<PathBuf> {
        self.global
            .descriptor
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| self.config.descriptor().path.clone())
            .map(|path| {
                if path.is_absolute() {
                    path
                } else {
                    self.cwd.join(path)
                }
            })
    }

    /// Locates the descriptor: `--file`, then `DX_DESCRIPTOR`, then the closest
    /// `dx.toml` above the working directory.
    ///
    /// # Errors
    /// Returns an error if no descriptor can be found.
    pub fn descriptor_path(&self) -> Result<PathBuf> {
        if let Some(path) = self.descriptor_path.get() {
            return Ok(path.clone());
        }
        let path = match self.explicit_descriptor() {
            Some(path) => path,
            None => current_descriptor()?,
        };
        debug!(path = %path.display(), "using descriptor");
        let _ = self.descriptor_path.set(path.clone());
        Ok(path)
    }

    /// Loads and validates the descriptor.
    ///
    /// # Errors
    /// Returns an error if the descriptor is missing or invalid.
    pub fn load_descriptor(&self) -> Result<(PathBuf, EnvironmentDescriptor)> {
        let path = self.descriptor_path()?;
        let descriptor = EnvironmentDescriptor::load(&path)?;
        Ok((path, descriptor))
    }

    /// Picks the platform to realize for: `--system`, then `DX_SYSTEM`, then the host.
    ///
    /// # Errors
    /// Returns a [`UserError`] for unknown platform names or unsupported hosts.
    pub fn target_platform(&self, explicit: Option<&str>) -> Result<TargetPlatform> {
        let requested = explicit.or(self.config.platform().system.as_deref());
        if let Some(raw) = requested {
            return raw.trim().parse::<TargetPlatform>().map_err(|_| {
                UserError::new(
                    format!("unknown platform `{raw}`"),
                    json!({
                        "reason": "unknown_platform",
                        "supported": TargetPlatform::all(),
                        "hint": "Use one of x86_64-linux, aarch64-linux, x86_64-darwin, aarch64-darwin.",
                    }),
                )
                .into()
            });
        }
        TargetPlatform::host().ok_or_else(|| {
            UserError::new(
                format!(
                    "host {}-{} has no package builds",
                    env::consts::ARCH,
                    env::consts::OS
                ),
                json!({
                    "reason": "unsupported_host",
                    "hint": "Pass --system to realize for a supported platform.",
                }),
            )
            .into()
        })
    }
}
