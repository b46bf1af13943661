use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::core::errors::{Error, Result};
use crate::storage::state::Tool;

/// Result of a tool's own "am I logged in" check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolStatus {
    pub logged_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// Per-tool capability object: binary name, the environment variable that
/// redirects the tool's config state, command builders, and the status probe.
///
/// Every constructed command injects `env_var() = profile_dir` on top of the
/// inherited environment, which is what isolates one profile from another.
#[async_trait]
pub trait Adapter: Send + Sync {
    fn tool(&self) -> Tool;
    fn binary(&self) -> &'static str;
    fn env_var(&self) -> &'static str;

    fn run_command(&self, profile_dir: &Path, args: &[String]) -> Command;
    fn login_command(&self, profile_dir: &Path) -> Command;
    fn logout_command(&self, profile_dir: &Path) -> Command;

    /// Probe the tool's auth state for one profile directory. Callers bound
    /// this with their own timeout; the spawned child is reaped when the
    /// probe future is dropped.
    async fn status(&self, profile_dir: &Path) -> Result<ToolStatus>;
}

/// The closed set of adapters, keyed by `Tool`.
///
/// Production code always uses `builtin()`; `new` exists so tests can inject
/// fakes, the same way the transport layer this crate grew out of accepts
/// arbitrary connection impls.
pub struct AdapterSet {
    adapters: Vec<Arc<dyn Adapter>>,
}

impl AdapterSet {
    pub fn new(adapters: Vec<Arc<dyn Adapter>>) -> Self {
        AdapterSet { adapters }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            Arc::new(super::claude::ClaudeAdapter),
            Arc::new(super::codex::CodexAdapter),
        ])
    }

    pub fn get(&self, tool: Tool) -> Result<Arc<dyn Adapter>> {
        self.adapters
            .iter()
            .find(|a| a.tool() == tool)
            .cloned()
            .ok_or_else(|| Error::UnsupportedTool(tool.to_string()))
    }
}

impl Default for AdapterSet {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Build `binary args...` with the profile directory injected into the
/// child's environment on top of the inherited one.
pub(crate) fn tool_command<I, S>(
    binary: &str,
    env_var: &str,
    profile_dir: &Path,
    args: I,
) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut cmd = Command::new(binary);
    cmd.args(args);
    cmd.env(env_var, profile_dir);
    cmd
}

pub(crate) fn ensure_binary(binary: &'static str) -> Result<()> {
    which::which(binary).map_err(|_| Error::AdapterUnavailable { binary })?;
    Ok(())
}

/// Run a probe command to completion, capturing stdout+stderr as one trimmed
/// string. `kill_on_drop` guarantees the child does not outlive a probe whose
/// timeout elapsed.
pub(crate) async fn combined_output(
    mut cmd: Command,
) -> Result<(String, std::process::ExitStatus)> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    let output = cmd.output().await?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok((text.trim().to_string(), output.status))
}
