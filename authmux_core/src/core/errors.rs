use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::storage::state::Tool;

/// A central error enum for everything the registry, the adapters, and the
/// session manager can fail with.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid profile name {name:?} (allowed: letters, digits, ., _, - ; max 64 chars)")]
    InvalidName { name: String },

    #[error("profile not found: {tool}/{name}")]
    ProfileNotFound { tool: Tool, name: String },

    #[error("target profile already exists: {tool}/{name}")]
    ProfileAlreadyExists { tool: Tool, name: String },

    #[error("no default profile set for {0}")]
    NoDefaultProfile(Tool),

    #[error("unsupported tool {0:?} (expected: claude or codex)")]
    UnsupportedTool(String),

    /// The registry file exists but cannot be parsed. No auto-repair.
    #[error("registry file {path} is corrupt: {source}")]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{binary} not found in PATH")]
    AdapterUnavailable { binary: &'static str },

    /// A child process exited with a non-zero code. The CLI propagates the
    /// code verbatim as its own exit status.
    #[error("process exited with code {0}")]
    ExitCode(i32),

    #[error("operation cancelled")]
    Cancelled,

    #[error("status check timed out after {0:?}")]
    StatusTimeout(Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Process exit status for this error: the child's own code for
    /// `ExitCode`, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ExitCode(code) => *code,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_propagates_child_code() {
        assert_eq!(Error::ExitCode(42).exit_code(), 42);
        assert_eq!(Error::Cancelled.exit_code(), 1);
        assert_eq!(
            Error::NoDefaultProfile(Tool::Claude).exit_code(),
            1,
        );
    }

    #[test]
    fn messages_name_the_offending_profile() {
        let err = Error::ProfileNotFound {
            tool: Tool::Codex,
            name: "work".into(),
        };
        assert_eq!(err.to_string(), "profile not found: codex/work");
    }
}
