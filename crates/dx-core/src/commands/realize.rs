use anyhow::Result;
use serde_json::json;

use super::activate;
use crate::config::context::CommandContext;
use crate::outcome::ExecutionOutcome;
use crate::status::known_error_outcome;

#[derive(Clone, Debug, Default)]
pub struct RealizeRequest {
    pub system: Option<String>,
}

/// Resolves the descriptor's dev shell and reports every tool location.
///
/// # Errors
/// Returns an error when resolution fails for reasons outside the descriptor.
pub fn realize_shell(ctx: &CommandContext, request: &RealizeRequest) -> Result<ExecutionOutcome> {
    let activated = match activate(ctx, request.system.as_deref()) {
        Ok(activated) => activated,
        Err(err) => return known_error_outcome(&err).ok_or(err),
    };
    let shell = &activated.shell;
    let path = shell.path_entry()?;
    Ok(ExecutionOutcome::success(
        format!(
            "resolved {} tools for {} from {}",
            shell.tools.len(),
            shell.platform,
            shell.locator
        ),
        json!({
            "descriptor": activated.descriptor.display().to_string(),
            "shell": shell,
            "path": path.to_string_lossy(),
            "fingerprint": shell.fingerprint(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{Workspace, PYTHON_DESCRIPTOR};
    use crate::outcome::CommandStatus;

    fn realize_for(workspace: &Workspace, system: &str) -> ExecutionOutcome {
        let global = workspace.global();
        let ctx = workspace.context(&global);
        realize_shell(
            &ctx,
            &RealizeRequest {
                system: Some(system.to_string()),
            },
        )
        .expect("realize")
    }

    #[test]
    fn reports_tool_paths_and_fingerprint() {
        let workspace = Workspace::new(Some(PYTHON_DESCRIPTOR));
        let outcome = realize_for(&workspace, "x86_64-linux");

        assert_eq!(outcome.status, CommandStatus::Ok);
        let shell = &outcome.details["shell"];
        assert_eq!(shell["revision"], "63dacb46bf939521bdc93981b4cbb7ecb58427a0");
        assert_eq!(shell["tools"]["black"], "/nix/store/cccc-black-24.4.2");
        assert_eq!(shell["shell_hook"], "echo ready");
        assert!(outcome.details["path"]
            .as_str()
            .expect("path")
            .starts_with("/nix/store/cccc-black-24.4.2/bin"));
        assert_eq!(outcome.details["fingerprint"].as_str().map(str::len), Some(64));
    }

    #[test]
    fn repeated_runs_agree() {
        let workspace = Workspace::new(Some(PYTHON_DESCRIPTOR));
        let first = realize_for(&workspace, "x86_64-linux");
        let second = realize_for(&workspace, "x86_64-linux");
        assert_eq!(first.details, second.details);
    }

    #[test]
    fn platform_gap_is_reported() {
        let workspace = Workspace::new(Some(PYTHON_DESCRIPTOR));
        let outcome = realize_for(&workspace, "aarch64-darwin");
        assert_eq!(outcome.status, CommandStatus::UserError);
        assert_eq!(outcome.details["reason"], "platform_unsupported");
        assert_eq!(outcome.details["packages"], json!(["isort"]));
    }

    #[test]
    fn undeclared_platform_is_rejected_before_resolution() {
        let workspace = Workspace::new(Some(PYTHON_DESCRIPTOR));
        let outcome = realize_for(&workspace, "aarch64-linux");
        assert_eq!(outcome.details["reason"], "platform_not_declared");
    }

    #[test]
    fn unknown_platform_name_is_a_user_error() {
        let workspace = Workspace::new(Some(PYTHON_DESCRIPTOR));
        let global = workspace.global();
        let ctx = workspace.context(&global);
        let err = realize_shell(
            &ctx,
            &RealizeRequest {
                system: Some("riscv64-plan9".to_string()),
            },
        )
        .unwrap_err();
        let user = err
            .downcast_ref::<crate::outcome::UserError>()
            .expect("user error");
        assert_eq!(user.details()["reason"], "unknown_platform");
    }

    #[test]
    fn unknown_revision_is_unresolved() {
        let descriptor = PYTHON_DESCRIPTOR.replace("nixos-24.05", "nixos-99.99");
        let workspace = Workspace::new(Some(descriptor.as_str()));
        let outcome = realize_for(&workspace, "x86_64-linux");
        assert_eq!(outcome.details["reason"], "unresolved_source");
        assert_eq!(outcome.details["input"], "nixpkgs");
    }
}
