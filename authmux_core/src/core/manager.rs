use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::adapters::adapter::{Adapter, AdapterSet, ToolStatus};
use crate::core::errors::{Error, Result};
use crate::core::exec::run_interactive;
use crate::storage::state::{validate_profile_name, Profile, RegistryState, Tool};
use crate::storage::store::{profile_dir, RegistryStore};

/// Upper bound for one profile's status probe. A probe that exceeds this is
/// reported as that row's error; the other rows are unaffected.
pub const STATUS_PROBE_TIMEOUT: Duration = Duration::from_secs(8);

/// One profile's entry in an aggregate status listing.
#[derive(Debug, Clone, Serialize)]
pub struct StatusRow {
    pub profile: Profile,
    pub status: ToolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Read-only health report: no mutations, diagnostics only.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    pub root_dir: PathBuf,
    pub tool_binaries: BTreeMap<Tool, bool>,
    pub profiles_total: usize,
    #[serde(rename = "missing_profile_dirs")]
    pub missing_dirs: Vec<String>,
    pub bad_defaults: Vec<String>,
}

/// Orchestrates the registry store and the tool adapters: profile lifecycle,
/// status aggregation, and interactive runs.
///
/// The manager holds no registry state between calls. Every operation
/// re-reads current truth from disk, so a concurrent invocation of another
/// authmux process is seen only as last-write-wins on the registry file.
pub struct Manager {
    store: RegistryStore,
    adapters: AdapterSet,
    status_timeout: Duration,
}

impl Manager {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Manager {
            store: RegistryStore::new(root)?,
            adapters: AdapterSet::builtin(),
            status_timeout: STATUS_PROBE_TIMEOUT,
        })
    }

    /// Manager over `$AUTHMUX_HOME` / `~/.authmux`.
    pub fn open_default() -> Result<Self> {
        Ok(Manager {
            store: RegistryStore::open_default()?,
            adapters: AdapterSet::builtin(),
            status_timeout: STATUS_PROBE_TIMEOUT,
        })
    }

    /// Manager with an injected adapter set. Tests use this to swap in fakes.
    pub fn with_adapters(root: impl Into<PathBuf>, adapters: AdapterSet) -> Result<Self> {
        Ok(Manager {
            store: RegistryStore::new(root)?,
            adapters,
            status_timeout: STATUS_PROBE_TIMEOUT,
        })
    }

    /// Override the per-profile probe timeout.
    pub fn with_status_timeout(mut self, status_timeout: Duration) -> Self {
        self.status_timeout = status_timeout;
        self
    }

    pub fn root(&self) -> &Path {
        self.store.root()
    }

    pub fn load(&self) -> Result<RegistryState> {
        self.store.load()
    }

    pub fn save(&self, state: &RegistryState) -> Result<()> {
        self.store.save(state)
    }

    fn adapter(&self, tool: Tool) -> Result<Arc<dyn Adapter>> {
        self.adapters.get(tool)
    }

    /// Idempotent create. The backing directory is created before the
    /// registry is touched; a directory failure leaves the registry as-is.
    /// The first profile for a tool becomes that tool's default.
    pub fn ensure_profile(&self, tool: Tool, name: &str) -> Result<(Profile, bool)> {
        validate_profile_name(name)?;
        let mut state = self.load()?;
        if let Some(existing) = state.find(tool, name) {
            return Ok((existing.clone(), false));
        }

        let dir = profile_dir(self.root(), tool, name);
        fs::create_dir_all(&dir)?;

        let profile = Profile {
            tool,
            name: name.to_string(),
            dir,
            created_at: Utc::now(),
        };
        state.profiles.push(profile.clone());
        state.normalize();
        state
            .defaults
            .entry(tool)
            .or_insert_with(|| name.to_string());
        self.save(&state)?;
        info!("created profile {tool}/{name}");
        Ok((profile, true))
    }

    pub fn get_profile(&self, state: &RegistryState, tool: Tool, name: &str) -> Result<Profile> {
        state
            .find(tool, name)
            .cloned()
            .ok_or_else(|| Error::ProfileNotFound {
                tool,
                name: name.to_string(),
            })
    }

    /// Explicit name if given, else the tool's default. A stale default
    /// (pointing at a removed profile) surfaces as `ProfileNotFound`.
    pub fn resolve_profile(
        &self,
        state: &RegistryState,
        tool: Tool,
        name: Option<&str>,
    ) -> Result<Profile> {
        if let Some(explicit) = name.filter(|n| !n.trim().is_empty()) {
            return self.get_profile(state, tool, explicit);
        }
        let default = state
            .default_for(tool)
            .ok_or(Error::NoDefaultProfile(tool))?
            .to_string();
        self.get_profile(state, tool, &default)
    }

    pub fn set_default(&self, tool: Tool, name: &str) -> Result<()> {
        let mut state = self.load()?;
        if state.find(tool, name).is_none() {
            return Err(Error::ProfileNotFound {
                tool,
                name: name.to_string(),
            });
        }
        state.defaults.insert(tool, name.to_string());
        self.save(&state)
    }

    /// The backing directory moves first; if the move fails the registry is
    /// untouched, so registry and filesystem never diverge on a failed
    /// rename. A default pointing at the old name follows the rename.
    pub fn rename_profile(&self, tool: Tool, old_name: &str, new_name: &str) -> Result<()> {
        validate_profile_name(new_name)?;
        let mut state = self.load()?;
        let idx = state
            .find_index(tool, old_name)
            .ok_or_else(|| Error::ProfileNotFound {
                tool,
                name: old_name.to_string(),
            })?;
        if state.find(tool, new_name).is_some() {
            return Err(Error::ProfileAlreadyExists {
                tool,
                name: new_name.to_string(),
            });
        }

        let old_dir = state.profiles[idx].dir.clone();
        let new_dir = profile_dir(self.root(), tool, new_name);
        if let Some(parent) = new_dir.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&old_dir, &new_dir)?;

        state.profiles[idx].name = new_name.to_string();
        state.profiles[idx].dir = new_dir;
        if state.defaults.get(&tool).map(String::as_str) == Some(old_name) {
            state.defaults.insert(tool, new_name.to_string());
        }
        state.normalize();
        self.save(&state)?;
        info!("renamed profile {tool}/{old_name} -> {tool}/{new_name}");
        Ok(())
    }

    /// Remove a profile from the registry. With `purge`, the backing
    /// directory is deleted first and a deletion failure aborts with the
    /// registry untouched; without it the directory stays on disk. If the
    /// removed profile was the tool's default, the default moves to the
    /// first remaining profile of that tool in sorted order, or is cleared.
    pub fn remove_profile(&self, tool: Tool, name: &str, purge: bool) -> Result<()> {
        let mut state = self.load()?;
        let idx = state
            .find_index(tool, name)
            .ok_or_else(|| Error::ProfileNotFound {
                tool,
                name: name.to_string(),
            })?;

        if purge {
            let dir = state.profiles[idx].dir.clone();
            match fs::remove_dir_all(&dir) {
                Ok(()) => info!("purged profile directory {}", dir.display()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }

        state.profiles.remove(idx);
        if state.defaults.get(&tool).map(String::as_str) == Some(name) {
            state.defaults.remove(&tool);
            let next = state.profiles_for(tool).next().map(|p| p.name.clone());
            if let Some(next) = next {
                state.defaults.insert(tool, next);
            }
        }
        self.save(&state)?;
        info!("removed profile {tool}/{name}");
        Ok(())
    }

    /// One profile's status, via its tool's adapter. Adapter errors (missing
    /// binary, probe failure) pass through unchanged.
    pub async fn status_for_profile(&self, profile: &Profile) -> Result<ToolStatus> {
        let adapter = self.adapter(profile.tool)?;
        adapter.status(&profile.dir).await
    }

    /// Status for every profile (optionally one tool), probed concurrently.
    ///
    /// Each probe runs under its own timeout, so one hung external tool can
    /// neither delay nor fail the other rows; a probe failure becomes that
    /// row's `error`. The call returns once every probe has completed or
    /// timed out, with rows in registry order. It fails outright only when
    /// the registry itself cannot be loaded.
    pub async fn status_rows(&self, filter: Option<Tool>) -> Result<Vec<StatusRow>> {
        let state = self.load()?;
        let profiles: Vec<Profile> = state
            .profiles
            .iter()
            .filter(|p| filter.map_or(true, |t| p.tool == t))
            .cloned()
            .collect();

        let probes = profiles.into_iter().map(|profile| async move {
            match timeout(self.status_timeout, self.status_for_profile(&profile)).await {
                Ok(Ok(status)) => StatusRow {
                    profile,
                    status,
                    error: None,
                },
                Ok(Err(err)) => {
                    warn!("status probe failed for {}/{}: {err}", profile.tool, profile.name);
                    StatusRow {
                        profile,
                        status: ToolStatus::default(),
                        error: Some(err.to_string()),
                    }
                }
                Err(_) => {
                    warn!(
                        "status probe for {}/{} timed out",
                        profile.tool, profile.name
                    );
                    StatusRow {
                        profile,
                        status: ToolStatus::default(),
                        error: Some(Error::StatusTimeout(self.status_timeout).to_string()),
                    }
                }
            }
        });

        Ok(join_all(probes).await)
    }

    /// Hand the terminal to `<tool> args...` under the given profile.
    pub async fn run_tool(
        &self,
        cancel: &CancellationToken,
        profile: &Profile,
        args: &[String],
    ) -> Result<()> {
        let adapter = self.adapter(profile.tool)?;
        run_interactive(adapter.run_command(&profile.dir, args), cancel).await
    }

    pub async fn login_profile(
        &self,
        cancel: &CancellationToken,
        profile: &Profile,
    ) -> Result<()> {
        let adapter = self.adapter(profile.tool)?;
        run_interactive(adapter.login_command(&profile.dir), cancel).await
    }

    pub async fn logout_profile(
        &self,
        cancel: &CancellationToken,
        profile: &Profile,
    ) -> Result<()> {
        let adapter = self.adapter(profile.tool)?;
        run_interactive(adapter.logout_command(&profile.dir), cancel).await
    }

    /// Structural health check: binaries on PATH, profile dirs present,
    /// defaults pointing at real profiles.
    pub fn doctor(&self) -> Result<DoctorReport> {
        let state = self.load()?;
        let mut report = DoctorReport {
            root_dir: self.root().to_path_buf(),
            tool_binaries: BTreeMap::new(),
            profiles_total: state.profiles.len(),
            missing_dirs: Vec::new(),
            bad_defaults: Vec::new(),
        };

        for tool in Tool::ALL {
            let resolvable = match self.adapter(tool) {
                Ok(adapter) => which::which(adapter.binary()).is_ok(),
                Err(_) => false,
            };
            report.tool_binaries.insert(tool, resolvable);
        }

        for profile in &state.profiles {
            if !profile.dir.exists() {
                report.missing_dirs.push(format!(
                    "{}/{} -> {}",
                    profile.tool,
                    profile.name,
                    profile.dir.display()
                ));
            }
        }

        for (tool, default) in &state.defaults {
            if default.trim().is_empty() {
                report.bad_defaults.push(format!("{tool} has empty default"));
                continue;
            }
            if state.find(*tool, default).is_none() {
                report
                    .bad_defaults
                    .push(format!("{tool} default {default:?} not found"));
            }
        }

        report.missing_dirs.sort();
        report.bad_defaults.sort();
        debug!(
            "doctor: {} profile(s), {} missing dir(s), {} bad default(s)",
            report.profiles_total,
            report.missing_dirs.len(),
            report.bad_defaults.len()
        );
        Ok(report)
    }
}
