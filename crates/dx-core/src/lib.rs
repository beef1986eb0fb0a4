#![deny(clippy::all)]

mod commands;
pub mod config;
pub mod diagnostics;
pub mod effects;
pub mod outcome;
pub mod process;
pub mod realize;
pub mod resolver;
mod status;

pub use crate::commands::{
    check_descriptor, enter_shell, env_script, init_descriptor, realize_shell, CheckRequest,
    EnvRequest, InitRequest, RealizeRequest, ShellRequest,
};
pub use crate::config::context::{CommandContext, CommandGroup, CommandInfo};
pub use crate::config::{Config, GlobalOptions};
pub use crate::diagnostics::commands as diag_commands;
pub use crate::effects::{Effects, SharedEffects, SystemEffects};
pub use crate::outcome::{CommandStatus, ExecutionOutcome, UserError};
pub use crate::process::RunOutput;
pub use crate::realize::{realize, realize_descriptor, ActivationError, RealizeError};
pub use crate::resolver::{
    IndexResolver, NixResolver, PackageLookup, PackageResolver, PinnedSnapshot, ResolveError,
};
pub use crate::status::{
    format_status_message, is_missing_descriptor_error, known_error_outcome,
    missing_descriptor_outcome, to_json_response, MISSING_DESCRIPTOR_HINT,
};

pub use dx_domain::{
    EnvironmentDescriptor, PackageName, PackageSource, ShellSpecification, TargetPlatform,
    ToolRequest,
};
