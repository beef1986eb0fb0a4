use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::platform::TargetPlatform;
use crate::source::LocatorError;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("{} not found", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{origin} is not valid TOML: {source}")]
    InvalidToml {
        origin: String,
        #[source]
        source: toml_edit::TomlError,
    },
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` must be {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },
    #[error("input `{input}` has an invalid locator `{locator}`: {source}")]
    InvalidLocator {
        input: String,
        locator: String,
        #[source]
        source: LocatorError,
    },
    #[error("unknown platform `{0}` in outputs.systems")]
    UnknownPlatform(String),
    #[error("outputs.devShell.buildInputs contains an empty package name")]
    EmptyPackageName,
    #[error("devShell source `{0}` is not declared under [inputs]")]
    UndeclaredSource(String),
    #[error("{0} inputs are declared; set outputs.devShell.source to pick one")]
    AmbiguousSource(usize),
    #[error("platform {platform} is not declared in outputs.systems")]
    PlatformNotDeclared {
        platform: TargetPlatform,
        declared: Vec<TargetPlatform>,
    },
}

impl DescriptorError {
    /// Machine-readable reason code surfaced in command output.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            DescriptorError::NotFound { .. } => "missing_descriptor",
            DescriptorError::Read { .. } => "unreadable_descriptor",
            DescriptorError::InvalidToml { .. } => "invalid_descriptor",
            DescriptorError::MissingField(_)
            | DescriptorError::InvalidField { .. }
            | DescriptorError::EmptyPackageName
            | DescriptorError::UndeclaredSource(_)
            | DescriptorError::AmbiguousSource(_) => "invalid_descriptor_field",
            DescriptorError::InvalidLocator { .. } => "invalid_locator",
            DescriptorError::UnknownPlatform(_) => "unknown_platform",
            DescriptorError::PlatformNotDeclared { .. } => "platform_not_declared",
        }
    }
}
