//! The `dx.toml` environment descriptor: pinned inputs plus the dev shell the
//! outputs define for each declared platform.

mod errors;
mod parse;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

pub use errors::DescriptorError;

use crate::platform::TargetPlatform;
use crate::request::{PackageName, ToolRequest};
use crate::source::PackageSource;

pub const DESCRIPTOR_FILE: &str = "dx.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnvironmentDescriptor {
    pub inputs: IndexMap<String, PackageSource>,
    pub outputs: Outputs,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Outputs {
    pub systems: Vec<TargetPlatform>,
    #[serde(rename = "devShell")]
    pub dev_shell: DevShell,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DevShell {
    pub source: String,
    #[serde(rename = "buildInputs")]
    pub build_inputs: Vec<PackageName>,
    pub env: BTreeMap<String, String>,
    #[serde(rename = "shellHook", skip_serializing_if = "Option::is_none")]
    pub shell_hook: Option<String>,
}

impl EnvironmentDescriptor {
    /// Parses descriptor text.
    ///
    /// # Errors
    /// Returns a [`DescriptorError`] when the text is not valid TOML or violates the schema.
    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        parse::parse_descriptor(text, DESCRIPTOR_FILE)
    }

    /// Reads and parses the descriptor at `path`.
    ///
    /// # Errors
    /// Returns a [`DescriptorError`] when the file is missing, unreadable or invalid.
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let text = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                DescriptorError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                DescriptorError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        parse::parse_descriptor(&text, &path.display().to_string())
    }

    /// The input the dev shell draws its packages from.
    #[must_use]
    pub fn shell_source(&self) -> &PackageSource {
        // parse() guarantees the devShell source names a declared input
        &self.inputs[self.outputs.dev_shell.source.as_str()]
    }

    #[must_use]
    pub fn tool_request(&self) -> ToolRequest {
        self.outputs.dev_shell.build_inputs.iter().cloned().collect()
    }

    /// Evaluates the outputs for `platform`.
    ///
    /// # Errors
    /// Returns [`DescriptorError::PlatformNotDeclared`] when the outputs are not
    /// defined for `platform`.
    pub fn dev_shell_for(&self, platform: TargetPlatform) -> Result<&DevShell, DescriptorError> {
        if self.outputs.systems.contains(&platform) {
            Ok(&self.outputs.dev_shell)
        } else {
            Err(DescriptorError::PlatformNotDeclared {
                platform,
                declared: self.outputs.systems.clone(),
            })
        }
    }
}
