#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod descriptor;
pub mod discovery;
pub mod platform;
pub mod request;
pub mod shell;
pub mod source;
pub mod template;

pub use descriptor::{
    DescriptorError, DevShell, EnvironmentDescriptor, Outputs, DESCRIPTOR_FILE,
};
pub use discovery::{
    current_descriptor, discover_descriptor, discover_descriptor_from, MISSING_DESCRIPTOR_MESSAGE,
};
pub use platform::TargetPlatform;
pub use request::{EmptyPackageName, PackageName, ToolRequest};
pub use shell::ShellSpecification;
pub use source::{Forge, LocatorError, PackageSource, SourceLocator};
pub use template::{python_shell_descriptor, DEFAULT_SNAPSHOT, PYTHON_TOOLS};
