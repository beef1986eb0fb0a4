use anyhow::Result;
use serde_json::json;

use super::{activate, SHELL_MARKER_ENV};
use crate::config::context::CommandContext;
use crate::outcome::ExecutionOutcome;
use crate::status::known_error_outcome;

#[derive(Clone, Debug, Default)]
pub struct EnvRequest {
    pub system: Option<String>,
}

/// Renders POSIX shell statements that activate the dev shell when evaluated.
///
/// # Errors
/// Returns an error when resolution fails for reasons outside the descriptor.
pub fn env_script(ctx: &CommandContext, request: &EnvRequest) -> Result<ExecutionOutcome> {
    let activated = match activate(ctx, request.system.as_deref()) {
        Ok(activated) => activated,
        Err(err) => return known_error_outcome(&err).ok_or(err),
    };
    let shell = &activated.shell;
    let path = shell.path_entry()?;
    let path = path.to_string_lossy();

    let mut lines = Vec::new();
    if !path.is_empty() {
        lines.push(format!("export PATH={}\"${{PATH:+:$PATH}}\"", quote(&path)));
    }
    for (key, value) in &shell.env {
        lines.push(format!("export {key}={}", quote(value)));
    }
    lines.push(format!("export {SHELL_MARKER_ENV}=1"));
    if let Some(hook) = &shell.shell_hook {
        lines.push(hook.trim_end().to_string());
    }
    let mut script = lines.join("\n");
    script.push('\n');

    Ok(ExecutionOutcome::success(
        format!("activation script for {}", shell.platform),
        json!({
            "descriptor": activated.descriptor.display().to_string(),
            "platform": shell.platform,
            "path": path,
            "env": shell.env,
            "script": script,
            "fingerprint": shell.fingerprint(),
        }),
    ))
}

/// Single-quotes `value` for a POSIX shell.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{Workspace, PYTHON_DESCRIPTOR};
    use crate::outcome::CommandStatus;

    #[test]
    fn quotes_embedded_single_quotes() {
        assert_eq!(quote("it's"), r"'it'\''s'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn script_exports_path_env_and_marker() {
        let workspace = Workspace::new(Some(PYTHON_DESCRIPTOR));
        let global = workspace.global();
        let ctx = workspace.context(&global);

        let outcome = env_script(
            &ctx,
            &EnvRequest {
                system: Some("x86_64-linux".into()),
            },
        )
        .expect("env");
        assert_eq!(outcome.status, CommandStatus::Ok);
        let script = outcome.details["script"].as_str().expect("script");
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(
            lines[0],
            "export PATH='/nix/store/cccc-black-24.4.2/bin:/nix/store/eeee-isort-5.13.2/bin:/nix/store/aaaa-python3-3.11.9/bin'\"${PATH:+:$PATH}\""
        );
        assert_eq!(lines[1], "export PIP_DISABLE_PIP_VERSION_CHECK='1'");
        assert_eq!(lines[2], "export DX_SHELL=1");
        assert_eq!(lines[3], "echo ready");
        assert!(workspace.runs().is_empty());
    }

    #[test]
    fn env_key_that_is_not_a_variable_name_is_rejected() {
        let descriptor = PYTHON_DESCRIPTOR.replace(
            "PIP_DISABLE_PIP_VERSION_CHECK = \"1\"",
            "\"X; touch /tmp/owned; Y\" = \"1\"",
        );
        let workspace = Workspace::new(Some(descriptor.as_str()));
        let global = workspace.global();
        let ctx = workspace.context(&global);

        let outcome = env_script(
            &ctx,
            &EnvRequest {
                system: Some("x86_64-linux".into()),
            },
        )
        .expect("env");
        assert_eq!(outcome.status, CommandStatus::UserError);
        assert_eq!(outcome.details["reason"], "invalid_descriptor_field");
        assert!(outcome.details.get("script").is_none());
    }
}
