use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use super::adapter::{combined_output, ensure_binary, tool_command, Adapter, ToolStatus};
use crate::core::errors::Result;
use crate::storage::state::Tool;

/// Codex. Profile isolation via `CODEX_HOME`.
pub struct CodexAdapter;

#[async_trait]
impl Adapter for CodexAdapter {
    fn tool(&self) -> Tool {
        Tool::Codex
    }

    fn binary(&self) -> &'static str {
        "codex"
    }

    fn env_var(&self) -> &'static str {
        "CODEX_HOME"
    }

    fn run_command(&self, profile_dir: &Path, args: &[String]) -> Command {
        tool_command(self.binary(), self.env_var(), profile_dir, args)
    }

    fn login_command(&self, profile_dir: &Path) -> Command {
        tool_command(self.binary(), self.env_var(), profile_dir, ["login"])
    }

    fn logout_command(&self, profile_dir: &Path) -> Command {
        tool_command(self.binary(), self.env_var(), profile_dir, ["logout"])
    }

    /// `codex login status` has no JSON mode; classify by substring and exit
    /// status. A non-zero exit with "not logged in" text is a normal
    /// logged-out state, not a probe failure.
    async fn status(&self, profile_dir: &Path) -> Result<ToolStatus> {
        ensure_binary(self.binary())?;
        let cmd = tool_command(
            self.binary(),
            self.env_var(),
            profile_dir,
            ["login", "status"],
        );
        let (out, exit) = combined_output(cmd).await?;
        let lowered = out.to_lowercase();
        let logged_out =
            lowered.contains("not logged") || lowered.contains("logged out") || !exit.success();
        Ok(ToolStatus {
            logged_in: !logged_out,
            method: None,
            raw: Some(out),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::path::PathBuf;

    #[test]
    fn run_command_environment() {
        let args = vec!["--profile".to_string(), "deep".to_string()];
        let cmd = CodexAdapter.run_command(&PathBuf::from("/tmp/codex-p"), &args);
        assert_eq!(cmd.as_std().get_program(), OsStr::new("codex"));
        assert!(cmd.as_std().get_envs().any(|(k, v)| {
            k == OsStr::new("CODEX_HOME") && v == Some(OsStr::new("/tmp/codex-p"))
        }));
    }

    #[test]
    fn login_and_logout_command_shape() {
        let dir = PathBuf::from("/tmp/p");
        let login: Vec<_> = CodexAdapter
            .login_command(&dir)
            .as_std()
            .get_args()
            .map(|a| a.to_os_string())
            .collect();
        assert_eq!(login, ["login"]);
        let logout: Vec<_> = CodexAdapter
            .logout_command(&dir)
            .as_std()
            .get_args()
            .map(|a| a.to_os_string())
            .collect();
        assert_eq!(logout, ["logout"]);
    }
}
