use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::adapter::{combined_output, ensure_binary, tool_command, Adapter, ToolStatus};
use crate::core::errors::{Error, Result};
use crate::storage::state::Tool;

/// Claude Code. State lives wherever `CLAUDE_CONFIG_DIR` points, which is
/// exactly the lever a per-profile directory needs.
pub struct ClaudeAdapter;

/// The subset of `claude auth status --json` we care about.
#[derive(Deserialize)]
struct ClaudeAuthStatus {
    #[serde(default, rename = "loggedIn")]
    logged_in: bool,
    #[serde(default, rename = "authMethod")]
    auth_method: Option<String>,
}

#[async_trait]
impl Adapter for ClaudeAdapter {
    fn tool(&self) -> Tool {
        Tool::Claude
    }

    fn binary(&self) -> &'static str {
        "claude"
    }

    fn env_var(&self) -> &'static str {
        "CLAUDE_CONFIG_DIR"
    }

    fn run_command(&self, profile_dir: &Path, args: &[String]) -> Command {
        tool_command(self.binary(), self.env_var(), profile_dir, args)
    }

    fn login_command(&self, profile_dir: &Path) -> Command {
        tool_command(self.binary(), self.env_var(), profile_dir, ["auth", "login"])
    }

    fn logout_command(&self, profile_dir: &Path) -> Command {
        tool_command(self.binary(), self.env_var(), profile_dir, ["auth", "logout"])
    }

    async fn status(&self, profile_dir: &Path) -> Result<ToolStatus> {
        ensure_binary(self.binary())?;
        let cmd = tool_command(
            self.binary(),
            self.env_var(),
            profile_dir,
            ["auth", "status", "--json"],
        );
        let (out, exit) = combined_output(cmd).await?;
        if !exit.success() {
            return Err(Error::ExitCode(exit.code().unwrap_or(-1)));
        }
        // Older CLI builds print human-readable text here; keep the raw
        // output and report logged-out rather than failing the row.
        match serde_json::from_str::<ClaudeAuthStatus>(&out) {
            Ok(parsed) => Ok(ToolStatus {
                logged_in: parsed.logged_in,
                method: parsed.auth_method.filter(|m| !m.is_empty()),
                raw: Some(out),
            }),
            Err(_) => Ok(ToolStatus {
                logged_in: false,
                method: None,
                raw: Some(out),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::path::PathBuf;

    #[test]
    fn login_command_shape() {
        let cmd = ClaudeAdapter.login_command(&PathBuf::from("/tmp/claude-p"));
        assert_eq!(cmd.as_std().get_program(), OsStr::new("claude"));
        let args: Vec<_> = cmd.as_std().get_args().collect();
        assert_eq!(args, ["auth", "login"]);
        assert!(cmd.as_std().get_envs().any(|(k, v)| {
            k == OsStr::new("CLAUDE_CONFIG_DIR") && v == Some(OsStr::new("/tmp/claude-p"))
        }));
    }

    #[test]
    fn run_command_forwards_args() {
        let args = vec!["--continue".to_string(), "hello".to_string()];
        let cmd = ClaudeAdapter.run_command(&PathBuf::from("/tmp/p"), &args);
        let got: Vec<_> = cmd.as_std().get_args().collect();
        assert_eq!(got, ["--continue", "hello"]);
    }

    #[test]
    fn status_json_field_names_match_cli_output() {
        let parsed: ClaudeAuthStatus =
            serde_json::from_str(r#"{"loggedIn":true,"authMethod":"oauth"}"#).unwrap();
        assert!(parsed.logged_in);
        assert_eq!(parsed.auth_method.as_deref(), Some("oauth"));
    }
}
