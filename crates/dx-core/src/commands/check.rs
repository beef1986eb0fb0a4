use anyhow::Result;
use serde_json::{json, Map, Value};

use crate::config::context::CommandContext;
use crate::outcome::ExecutionOutcome;
use crate::status::known_error_outcome;

#[derive(Clone, Debug, Default)]
pub struct CheckRequest;

/// Validates the descriptor without contacting the package manager.
///
/// # Errors
/// Returns an error when the failure is not a descriptor problem.
pub fn check_descriptor(
    ctx: &CommandContext,
    _request: &CheckRequest,
) -> Result<ExecutionOutcome> {
    let (path, descriptor) = match ctx.load_descriptor() {
        Ok(loaded) => loaded,
        Err(err) => return known_error_outcome(&err).ok_or(err),
    };

    let inputs: Map<String, Value> = descriptor
        .inputs
        .iter()
        .map(|(name, source)| (name.clone(), json!(source.locator.to_string())))
        .collect();
    let source = descriptor.shell_source();
    let tools = descriptor.tool_request();
    Ok(ExecutionOutcome::success(
        format!(
            "{} is valid ({} tools from {})",
            path.display(),
            tools.len(),
            source.name
        ),
        json!({
            "path": path.display().to_string(),
            "inputs": inputs,
            "source": source.name,
            "revision": source.locator.revision(),
            "systems": descriptor.outputs.systems,
            "tools": tools.iter().collect::<Vec<_>>(),
        }),
    ))
}
