use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::platform::TargetPlatform;
use crate::request::PackageName;

/// Resolved, ready-to-activate shell. Built fresh for every activation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShellSpecification {
    pub source: String,
    pub locator: String,
    pub revision: String,
    pub platform: TargetPlatform,
    pub tools: BTreeMap<PackageName, PathBuf>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell_hook: Option<String>,
}

impl ShellSpecification {
    pub fn tool_names(&self) -> BTreeSet<&PackageName> {
        self.tools.keys().collect()
    }

    /// `bin/` directories of every resolved tool, deduplicated, in tool-name order.
    #[must_use]
    pub fn bin_dirs(&self) -> Vec<PathBuf> {
        let mut seen = BTreeSet::new();
        self.tools
            .values()
            .map(|prefix| prefix.join("bin"))
            .filter(|dir| seen.insert(dir.clone()))
            .collect()
    }

    /// Aggregate `PATH`-style entry covering every tool.
    ///
    /// # Errors
    /// Returns an error if a tool path contains the platform path separator.
    pub fn path_entry(&self) -> Result<OsString> {
        env::join_paths(self.bin_dirs()).context("tool path cannot be joined into PATH")
    }

    /// The shell's entry prepended to an inherited `PATH`.
    ///
    /// # Errors
    /// Returns an error if a tool path contains the platform path separator.
    pub fn prepend_to_path(&self, inherited: Option<OsString>) -> Result<OsString> {
        let mut dirs = self.bin_dirs();
        if let Some(existing) = inherited {
            dirs.extend(env::split_paths(&existing));
        }
        env::join_paths(dirs).context("tool path cannot be joined into PATH")
    }

    /// Stable digest over the inputs that determine the shell contents.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.locator.as_bytes());
        hasher.update([0]);
        hasher.update(self.revision.as_bytes());
        hasher.update([0]);
        hasher.update(self.platform.as_str().as_bytes());
        for (name, path) in &self.tools {
            hasher.update([0]);
            hasher.update(name.as_str().as_bytes());
            hasher.update([b'=']);
            hasher.update(path.to_string_lossy().as_bytes());
        }
        for (key, value) in &self.env {
            hasher.update([0]);
            hasher.update(key.as_bytes());
            hasher.update([b'=']);
            hasher.update(value.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_of(tools: &[(&str, &str)]) -> ShellSpecification {
        ShellSpecification {
            source: "pkgs".into(),
            locator: "github:acme/pkgs/2024-05".into(),
            revision: "2024-05".into(),
            platform: TargetPlatform::X86_64Linux,
            tools: tools
                .iter()
                .map(|(name, path)| (PackageName::new(name).unwrap(), PathBuf::from(path)))
                .collect(),
            env: BTreeMap::new(),
            shell_hook: None,
        }
    }

    #[test]
    fn bin_dirs_skip_shared_prefixes() {
        let shell = shell_of(&[
            ("black", "/store/py-env"),
            ("isort", "/store/py-env"),
            ("pip", "/store/pip"),
        ]);
        assert_eq!(
            shell.bin_dirs(),
            vec![PathBuf::from("/store/py-env/bin"), PathBuf::from("/store/pip/bin")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn prepends_to_inherited_path() {
        let shell = shell_of(&[("pip", "/store/pip")]);
        let path = shell
            .prepend_to_path(Some(OsString::from("/usr/bin:/bin")))
            .unwrap();
        assert_eq!(path, OsString::from("/store/pip/bin:/usr/bin:/bin"));
    }

    #[test]
    fn fingerprint_tracks_tool_paths() {
        let first = shell_of(&[("pip", "/store/a-pip")]);
        let same = shell_of(&[("pip", "/store/a-pip")]);
        let moved = shell_of(&[("pip", "/store/b-pip")]);
        assert_eq!(first.fingerprint(), same.fingerprint());
        assert_ne!(first.fingerprint(), moved.fingerprint());
    }
}
