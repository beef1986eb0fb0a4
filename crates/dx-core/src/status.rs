use dx_domain::{DescriptorError, MISSING_DESCRIPTOR_MESSAGE};
use serde_json::{json, Value};

use crate::config::context::CommandInfo;
use crate::outcome::ExecutionOutcome;
use crate::realize::{ActivationError, RealizeError};

pub const MISSING_DESCRIPTOR_HINT: &str =
    "Run `dx init` to create dx.toml, or pass --file to point at one.";

pub fn missing_descriptor_outcome() -> ExecutionOutcome {
    ExecutionOutcome::user_error(
        MISSING_DESCRIPTOR_MESSAGE,
        json!({
            "reason": "missing_descriptor",
            "hint": MISSING_DESCRIPTOR_HINT,
        }),
    )
}

pub fn is_missing_descriptor_error(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.to_string().contains(MISSING_DESCRIPTOR_MESSAGE))
}

#[must_use]
pub fn descriptor_error_outcome(err: &DescriptorError) -> ExecutionOutcome {
    let hint = match err {
        DescriptorError::NotFound { .. } => MISSING_DESCRIPTOR_HINT,
        DescriptorError::Read { .. } => "Check the file permissions and rerun the command.",
        DescriptorError::InvalidToml { .. } => "Fix dx.toml syntax and rerun the command.",
        DescriptorError::InvalidLocator { .. } => {
            "Pin the input to a revision, e.g. github:NixOS/nixpkgs/nixos-24.05."
        }
        DescriptorError::UnknownPlatform(_) => {
            "Use x86_64-linux, aarch64-linux, x86_64-darwin or aarch64-darwin."
        }
        DescriptorError::PlatformNotDeclared { .. } => {
            "Add the platform to outputs.systems or pass --system."
        }
        DescriptorError::AmbiguousSource(_) | DescriptorError::UndeclaredSource(_) => {
            "Set outputs.devShell.source to one of the names under [inputs]."
        }
        DescriptorError::MissingField(_)
        | DescriptorError::InvalidField { .. }
        | DescriptorError::EmptyPackageName => "Fix dx.toml and rerun the command.",
    };
    let mut details = json!({
        "reason": err.reason(),
        "hint": hint,
    });
    match err {
        DescriptorError::NotFound { path } | DescriptorError::Read { path, .. } => {
            details["path"] = json!(path.display().to_string());
        }
        DescriptorError::PlatformNotDeclared { declared, .. } => {
            details["declared"] = json!(declared);
        }
        DescriptorError::InvalidLocator { input, locator, .. } => {
            details["input"] = json!(input);
            details["locator"] = json!(locator);
        }
        _ => {}
    }
    ExecutionOutcome::user_error(err.to_string(), details)
}

#[must_use]
pub fn realize_error_outcome(err: &RealizeError) -> ExecutionOutcome {
    match err {
        RealizeError::UnresolvedSource {
            input,
            locator,
            reason,
        } => ExecutionOutcome::user_error(
            err.to_string(),
            json!({
                "reason": err.reason(),
                "input": input,
                "locator": locator,
                "cause": reason,
                "hint": "Check that the repository exists and the revision is spelled correctly.",
            }),
        ),
        RealizeError::UnknownPackage { locator, names } => ExecutionOutcome::user_error(
            err.to_string(),
            json!({
                "reason": err.reason(),
                "locator": locator,
                "packages": names,
                "hint": "Remove or rename the package in outputs.devShell.buildInputs.",
            }),
        ),
        RealizeError::PlatformUnsupported {
            locator,
            platform,
            names,
        } => ExecutionOutcome::user_error(
            err.to_string(),
            json!({
                "reason": err.reason(),
                "locator": locator,
                "platform": platform,
                "packages": names,
                "hint": "Drop the platform from outputs.systems or pick packages built for it.",
            }),
        ),
        RealizeError::ResolverUnavailable { backend, reason } => ExecutionOutcome::user_error(
            err.to_string(),
            json!({
                "reason": err.reason(),
                "backend": backend,
                "cause": reason,
                "hint": "Install nix (with a builder for the target system), set DX_NIX_BIN, or point DX_SNAPSHOT_INDEX at an index file.",
            }),
        ),
        RealizeError::Resolver(inner) => ExecutionOutcome::failure(
            "package resolution failed",
            json!({
                "reason": err.reason(),
                "error": format!("{inner:#}"),
            }),
        ),
    }
}

#[must_use]
pub fn activation_error_outcome(err: &ActivationError) -> ExecutionOutcome {
    match err {
        ActivationError::Descriptor(err) => descriptor_error_outcome(err),
        ActivationError::Realize(err) => realize_error_outcome(err),
    }
}

/// Maps the loader's typed errors anywhere in `err`'s chain onto an outcome.
pub fn known_error_outcome(err: &anyhow::Error) -> Option<ExecutionOutcome> {
    if is_missing_descriptor_error(err) {
        return Some(missing_descriptor_outcome());
    }
    err.chain().find_map(|cause| {
        if let Some(err) = cause.downcast_ref::<ActivationError>() {
            Some(activation_error_outcome(err))
        } else if let Some(err) = cause.downcast_ref::<DescriptorError>() {
            Some(descriptor_error_outcome(err))
        } else {
            cause.downcast_ref::<RealizeError>().map(realize_error_outcome)
        }
    })
}

#[must_use]
pub fn to_json_response(info: CommandInfo, outcome: &ExecutionOutcome) -> Value {
    let details = match &outcome.details {
        Value::Object(_) => outcome.details.clone(),
        Value::Null => json!({}),
        other => json!({ "value": other }),
    };
    json!({
        "status": outcome.status.label(),
        "message": format_status_message(info, &outcome.message),
        "details": details,
    })
}

#[must_use]
pub fn format_status_message(info: CommandInfo, message: &str) -> String {
    let group_name = info.group.to_string();
    let prefix = if group_name == info.name {
        format!("dx {}", info.name)
    } else {
        format!("dx {} {}", group_name, info.name)
    };
    if message.is_empty() {
        prefix
    } else if message.starts_with(&prefix) {
        message.to_string()
    } else {
        format!("{prefix}: {message}")
    }
}
