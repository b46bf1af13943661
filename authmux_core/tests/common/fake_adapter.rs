//! A deterministic **in-process stand-in** for any type that implements
//! `authmux_core::adapters::adapter::Adapter`.
//!
//! *  **From the test's perspective**
//!    * The probe outcome is keyed off the profile *name* (the last path
//!      segment of the probed directory):
//!      - names starting with `hang` never complete (until the probe's
//!        timeout reaps them),
//!      - names starting with `fail` return an error,
//!      - everything else reports a logged-in status.
//!    * `probe_count` records how many probes actually started.
//!
//! *  **Why this exists**: It lets integration tests exercise the *real*
//!    concurrent fan-out (per-probe timeouts, partial failure, ordering)
//!    without spawning external binaries.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use authmux_core::adapters::adapter::{Adapter, ToolStatus};
use authmux_core::core::errors::Result;
use authmux_core::storage::state::Tool;

pub struct FakeAdapter {
    tool: Tool,
    /// Exit code the run/login/logout commands terminate with.
    pub run_exit_code: i32,
    pub probe_count: Arc<AtomicUsize>,
}

impl FakeAdapter {
    pub fn new(tool: Tool) -> Self {
        FakeAdapter {
            tool,
            run_exit_code: 0,
            probe_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_run_exit_code(tool: Tool, run_exit_code: i32) -> Self {
        FakeAdapter {
            run_exit_code,
            ..Self::new(tool)
        }
    }

    fn shell_command(&self) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", &format!("exit {}", self.run_exit_code)]);
        cmd
    }
}

#[async_trait]
impl Adapter for FakeAdapter {
    fn tool(&self) -> Tool {
        self.tool
    }

    fn binary(&self) -> &'static str {
        "fake-tool"
    }

    fn env_var(&self) -> &'static str {
        "FAKE_TOOL_HOME"
    }

    fn run_command(&self, profile_dir: &Path, _args: &[String]) -> Command {
        let mut cmd = self.shell_command();
        cmd.env(self.env_var(), profile_dir);
        cmd
    }

    fn login_command(&self, profile_dir: &Path) -> Command {
        self.run_command(profile_dir, &[])
    }

    fn logout_command(&self, profile_dir: &Path) -> Command {
        self.run_command(profile_dir, &[])
    }

    async fn status(&self, profile_dir: &Path) -> Result<ToolStatus> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        let name = profile_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if name.starts_with("hang") {
            // Far beyond any per-probe timeout a test would configure.
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if name.starts_with("fail") {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("probe blew up for {name}"),
            )
            .into());
        }
        Ok(ToolStatus {
            logged_in: true,
            method: Some("fake".to_string()),
            raw: Some(format!("status for {name}")),
        })
    }
}
