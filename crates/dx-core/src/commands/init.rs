use std::fs;

use anyhow::{Context, Result};
use dx_domain::{python_shell_descriptor, SourceLocator, DEFAULT_SNAPSHOT, PYTHON_TOOLS};
use serde_json::json;
use tracing::info;

use crate::config::context::CommandContext;
use crate::outcome::ExecutionOutcome;

#[derive(Clone, Debug, Default)]
pub struct InitRequest {
    pub force: bool,
    /// Pinned snapshot locator to use instead of the default.
    pub snapshot: Option<String>,
}

/// Writes a starter `dx.toml` describing a Python development shell.
///
/// # Errors
/// Returns an error if the descriptor cannot be written.
pub fn init_descriptor(ctx: &CommandContext, request: &InitRequest) -> Result<ExecutionOutcome> {
    let target = ctx.init_target();
    if target.exists() && !request.force {
        return Ok(ExecutionOutcome::user_error(
            format!("{} already exists", target.display()),
            json!({
                "reason": "descriptor_exists",
                "path": target.display().to_string(),
                "hint": "Pass --force to overwrite it.",
            }),
        ));
    }

    let snapshot = request
        .snapshot
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_SNAPSHOT);
    if let Err(err) = snapshot.parse::<SourceLocator>() {
        return Ok(ExecutionOutcome::user_error(
            format!("snapshot `{snapshot}` is not a pinned locator: {err}"),
            json!({
                "reason": "invalid_locator",
                "locator": snapshot,
                "hint": "Use a locator with a revision, e.g. github:NixOS/nixpkgs/nixos-24.05.",
            }),
        ));
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&target, python_shell_descriptor(snapshot))
        .with_context(|| format!("failed to write {}", target.display()))?;
    info!(path = %target.display(), snapshot, "wrote descriptor");

    Ok(ExecutionOutcome::success(
        format!("wrote {}", target.display()),
        json!({
            "path": target.display().to_string(),
            "snapshot": snapshot,
            "tools": PYTHON_TOOLS,
        }),
    ))
}
