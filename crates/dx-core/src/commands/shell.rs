use std::io;
use std::path::Path;

use anyhow::Result;
use serde_json::json;
use tracing::{debug, info};

use super::{activate, shell_vars};
use crate::config::context::CommandContext;
use crate::outcome::ExecutionOutcome;
use crate::status::known_error_outcome;

const DEFAULT_SHELL: &str = "sh";
const NOT_FOUND_CODE: i32 = 127;

#[derive(Clone, Debug, Default)]
pub struct ShellRequest {
    pub system: Option<String>,
    /// Command to run inside the shell; an interactive `$SHELL` when empty.
    pub command: Vec<String>,
}

/// Runs a command, or an interactive shell, with the dev shell activated.
///
/// The child's exit code is reported under `details.exit_code`.
///
/// # Errors
/// Returns an error when resolution fails for reasons outside the descriptor
/// or the child cannot be spawned.
pub fn enter_shell(ctx: &CommandContext, request: &ShellRequest) -> Result<ExecutionOutcome> {
    let activated = match activate(ctx, request.system.as_deref()) {
        Ok(activated) => activated,
        Err(err) => return known_error_outcome(&err).ok_or(err),
    };
    let shell = &activated.shell;
    let envs = shell_vars(shell, ctx.env().var("PATH"))?;

    let (program, args) = match request.command.split_first() {
        Some((program, args)) => (program.clone(), args.to_vec()),
        None => (
            ctx.env().var("SHELL").unwrap_or(DEFAULT_SHELL).to_string(),
            Vec::new(),
        ),
    };
    let target = program.clone();
    let (program, args) = match &shell.shell_hook {
        // the hook runs in a wrapper shell that then execs the target
        Some(hook) => {
            let mut wrapped = vec![
                "-c".to_string(),
                format!("{hook}\nexec \"$@\""),
                "dx-shell".to_string(),
                program,
            ];
            wrapped.extend(args);
            (DEFAULT_SHELL.to_string(), wrapped)
        }
        None => (program, args),
    };

    debug!(%program, ?args, tools = shell.tools.len(), "entering shell");
    let output = match ctx.process().run_passthrough(&program, &args, &envs, ctx.cwd()) {
        Ok(output) => output,
        Err(err) if is_not_found(&err) => return Ok(command_not_found(&target)),
        Err(err) => return Err(err),
    };
    info!(code = output.code, "shell exited");

    // the hook wrapper reports a failed exec as 127
    if shell.shell_hook.is_some()
        && output.code == NOT_FOUND_CODE
        && !on_path(&target, &envs, ctx.cwd())
    {
        return Ok(command_not_found(&target));
    }

    let command = request
        .command
        .first()
        .cloned()
        .unwrap_or_else(|| "shell".to_string());
    Ok(ExecutionOutcome::success(
        format!("{command} exited with status {}", output.code),
        json!({
            "descriptor": activated.descriptor.display().to_string(),
            "platform": shell.platform,
            "fingerprint": shell.fingerprint(),
            "exit_code": output.code,
        }),
    ))
}

fn command_not_found(program: &str) -> ExecutionOutcome {
    ExecutionOutcome::user_error(
        format!("command `{program}` not found"),
        json!({
            "reason": "command_not_found",
            "program": program,
            "hint": "Add the package providing it to outputs.devShell.buildInputs.",
        }),
    )
}

fn on_path(program: &str, envs: &[(String, String)], cwd: &Path) -> bool {
    let path = envs
        .iter()
        .find(|(key, _)| key == "PATH")
        .map(|(_, value)| value.as_str());
    which::which_in(program, path, cwd).is_ok()
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|io_err| io_err.kind() == io::ErrorKind::NotFound)
    })
}
