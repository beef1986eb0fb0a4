use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of one `dx` command: how it ended, a one-line message, and the
/// machine-readable details rendered under `--json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub status: CommandStatus,
    pub message: String,
    #[serde(default)]
    pub details: Value,
}

impl ExecutionOutcome {
    fn with_status(status: CommandStatus, message: impl Into<String>, details: Value) -> Self {
        Self {
            status,
            message: message.into(),
            details,
        }
    }

    pub fn success(message: impl Into<String>, details: Value) -> Self {
        Self::with_status(CommandStatus::Ok, message, details)
    }

    pub fn user_error(message: impl Into<String>, details: Value) -> Self {
        Self::with_status(CommandStatus::UserError, message, details)
    }

    pub fn failure(message: impl Into<String>, details: Value) -> Self {
        Self::with_status(CommandStatus::Failure, message, details)
    }

    /// Exit code a child process asked for, when the command ran one.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.details
            .get("exit_code")
            .and_then(Value::as_i64)
            .and_then(|code| i32::try_from(code).ok())
    }
}

/// An expected failure the user can fix, carried through `anyhow` chains.
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct UserError {
    message: String,
    details: Value,
}

impl UserError {
    pub fn new(message: impl Into<String>, details: Value) -> Self {
        Self {
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn details(&self) -> &Value {
        &self.details
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    UserError,
    Failure,
}

impl CommandStatus {
    /// Spelling used in the JSON envelope.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CommandStatus::Ok => "ok",
            CommandStatus::UserError => "user-error",
            CommandStatus::Failure => "error",
        }
    }

    /// Process exit code; a successful `dx shell` overrides it with the child's.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            CommandStatus::Ok => 0,
            CommandStatus::UserError => 1,
            CommandStatus::Failure => 2,
        }
    }
}
