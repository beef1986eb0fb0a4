use std::env;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Host class a shell is built for, spelled the way package snapshots key
/// their per-platform builds.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum TargetPlatform {
    #[serde(rename = "x86_64-linux")]
    #[strum(serialize = "x86_64-linux")]
    X86_64Linux,
    #[serde(rename = "aarch64-linux")]
    #[strum(serialize = "aarch64-linux")]
    Aarch64Linux,
    #[serde(rename = "x86_64-darwin")]
    #[strum(serialize = "x86_64-darwin")]
    X86_64Darwin,
    #[serde(rename = "aarch64-darwin")]
    #[strum(serialize = "aarch64-darwin")]
    Aarch64Darwin,
}

impl TargetPlatform {
    /// Detects the platform of the running process.
    ///
    /// Returns `None` on hosts no snapshot publishes builds for.
    #[must_use]
    pub fn host() -> Option<Self> {
        Self::from_parts(env::consts::ARCH, env::consts::OS)
    }

    fn from_parts(arch: &str, os: &str) -> Option<Self> {
        match (arch, os) {
            ("x86_64", "linux") => Some(Self::X86_64Linux),
            ("aarch64", "linux") => Some(Self::Aarch64Linux),
            ("x86_64", "macos") => Some(Self::X86_64Darwin),
            ("aarch64", "macos") => Some(Self::Aarch64Darwin),
            _ => None,
        }
    }

    #[must_use]
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snapshot_spelling() {
        assert_eq!(
            "aarch64-darwin".parse::<TargetPlatform>().unwrap(),
            TargetPlatform::Aarch64Darwin
        );
        assert_eq!(TargetPlatform::X86_64Linux.to_string(), "x86_64-linux");
        assert!("x86_64-windows".parse::<TargetPlatform>().is_err());
    }

    #[test]
    fn maps_rust_host_names() {
        assert_eq!(
            TargetPlatform::from_parts("aarch64", "macos"),
            Some(TargetPlatform::Aarch64Darwin)
        );
        assert_eq!(TargetPlatform::from_parts("riscv64", "linux"), None);
    }

    #[test]
    fn serde_uses_the_same_spelling() {
        let value = serde_json::to_value(TargetPlatform::Aarch64Linux).unwrap();
        assert_eq!(value, serde_json::json!("aarch64-linux"));
    }
}
