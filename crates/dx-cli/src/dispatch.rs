use color_eyre::Result;
use dx_core::{
    CheckRequest, CommandContext, CommandGroup, CommandInfo, EnvRequest, ExecutionOutcome,
    InitRequest, RealizeRequest, ShellRequest, UserError,
};
use serde_json::json;
use tracing::debug;

use crate::cli::{CommandGroupCli, InitArgs, ShellArgs, SystemArgs};

pub fn command_info(group: &CommandGroupCli) -> CommandInfo {
    match group {
        CommandGroupCli::Init(_) => CommandInfo::new(CommandGroup::Init, "init"),
        CommandGroupCli::Check => CommandInfo::new(CommandGroup::Check, "check"),
        CommandGroupCli::Realize(_) => CommandInfo::new(CommandGroup::Realize, "realize"),
        CommandGroupCli::Env(_) => CommandInfo::new(CommandGroup::Env, "env"),
        CommandGroupCli::Shell(_) => CommandInfo::new(CommandGroup::Shell, "shell"),
    }
}

pub fn dispatch_command(
    ctx: &CommandContext,
    group: &CommandGroupCli,
) -> Result<(CommandInfo, ExecutionOutcome)> {
    let info = command_info(group);
    match group {
        CommandGroupCli::Init(InitArgs { force, snapshot }) => {
            let request = InitRequest {
                force: *force,
                snapshot: snapshot.clone(),
            };
            core_call(info, || dx_core::init_descriptor(ctx, &request))
        }
        CommandGroupCli::Check => core_call(info, || dx_core::check_descriptor(ctx, &CheckRequest)),
        CommandGroupCli::Realize(SystemArgs { system }) => {
            let request = RealizeRequest {
                system: system.clone(),
            };
            core_call(info, || dx_core::realize_shell(ctx, &request))
        }
        CommandGroupCli::Env(SystemArgs { system }) => {
            let request = EnvRequest {
                system: system.clone(),
            };
            core_call(info, || dx_core::env_script(ctx, &request))
        }
        CommandGroupCli::Shell(ShellArgs { target, command }) => {
            let request = ShellRequest {
                system: target.system.clone(),
                command: command.clone(),
            };
            core_call(info, || dx_core::enter_shell(ctx, &request))
        }
    }
}

/// Wraps a context construction failure in the same envelope commands use.
pub fn context_failure(err: &anyhow::Error) -> ExecutionOutcome {
    error_outcome(err)
}

fn core_call<F>(info: CommandInfo, action: F) -> Result<(CommandInfo, ExecutionOutcome)>
where
    F: FnOnce() -> anyhow::Result<ExecutionOutcome>,
{
    debug!(command = %info.group, "dispatching");
    match action() {
        Ok(outcome) => Ok((info, outcome)),
        Err(err) => Ok((info, error_outcome(&err))),
    }
}

fn error_outcome(err: &anyhow::Error) -> ExecutionOutcome {
    if let Some(outcome) = dx_core::known_error_outcome(err) {
        return outcome;
    }
    if let Some(user) = err.downcast_ref::<UserError>() {
        return ExecutionOutcome::user_error(user.message().to_string(), user.details().clone());
    }
    let issues: Vec<String> = err.chain().map(ToString::to_string).collect();
    ExecutionOutcome::failure(
        err.to_string(),
        json!({
            "reason": "internal_error",
            "error": err.to_string(),
            "issues": issues,
            "hint": "Re-run with -vv for more detail, or open an issue if this persists.",
        }),
    )
}
