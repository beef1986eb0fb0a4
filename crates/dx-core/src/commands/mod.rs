mod check;
mod env;
mod init;
mod realize;
mod shell;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use anyhow::Result;
use dx_domain::ShellSpecification;
use tracing::debug;

use crate::config::context::CommandContext;
use crate::realize::realize_descriptor;

pub use check::{check_descriptor, CheckRequest};
pub use env::{env_script, EnvRequest};
pub use init::{init_descriptor, InitRequest};
pub use realize::{realize_shell, RealizeRequest};
pub use shell::{enter_shell, ShellRequest};

pub(crate) const SHELL_MARKER_ENV: &str = "DX_SHELL";

struct Activated {
    descriptor: PathBuf,
    shell: ShellSpecification,
}

/// Loads the descriptor and realizes its dev shell for the requested platform.
fn activate(ctx: &CommandContext, system: Option<&str>) -> Result<Activated> {
    let (descriptor_path, descriptor) = ctx.load_descriptor()?;
    let platform = ctx.target_platform(system)?;
    debug!(
        descriptor = %descriptor_path.display(),
        %platform,
        resolver = ctx.resolver().name(),
        "activating descriptor"
    );
    let shell = realize_descriptor(ctx.resolver(), &descriptor, platform)?;
    Ok(Activated {
        descriptor: descriptor_path,
        shell,
    })
}

/// Environment variables an activated shell runs with.
fn shell_vars(
    shell: &ShellSpecification,
    inherited_path: Option<&str>,
) -> Result<Vec<(String, String)>> {
    let path = shell.prepend_to_path(inherited_path.map(Into::into))?;
    let path = path
        .into_string()
        .map_err(|_| anyhow::anyhow!("tool path is not valid UTF-8"))?;
    let mut vars = vec![("PATH".to_string(), path)];
    vars.extend(
        shell
            .env
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    vars.push((SHELL_MARKER_ENV.to_string(), "1".to_string()));
    Ok(vars)
}
