//! Generated launcher shims: tiny `claude-<profile>` / `codex-<profile>`
//! scripts that re-enter authmux with a fixed tool and profile, so a shell
//! user can jump straight into one identity.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use log::debug;

use authmux_core::core::errors::{Error, Result};
use authmux_core::storage::state::{Profile, Tool};

/// Marker line identifying shims we own; `remove_all` refuses to delete
/// anything without it.
const SHIM_MARKER: &str = "generated by authmux; do not edit";

pub fn shim_name(tool: Tool, profile: &str) -> String {
    if cfg!(windows) {
        format!("{tool}-{profile}.cmd")
    } else {
        format!("{tool}-{profile}")
    }
}

/// `~/.local/bin` on Unix, `<home>\.authmux\bin` on Windows. Callers can
/// always point `--dir` somewhere else.
pub fn default_shim_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().ok_or_else(|| {
        Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "unable to locate home directory",
        ))
    })?;
    if cfg!(windows) {
        Ok(base.home_dir().join(".authmux").join("bin"))
    } else {
        Ok(base.home_dir().join(".local").join("bin"))
    }
}

/// Best-effort path to the authmux binary a shim should call back into.
pub fn resolve_authmux_bin() -> String {
    if let Ok(exe) = env::current_exe() {
        if let Some(exe) = exe.to_str() {
            if !exe.trim().is_empty() {
                return exe.to_string();
            }
        }
    }
    "authmux".to_string()
}

pub fn install(dir: &Path, profile: &Profile, authmux_bin: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(shim_name(profile.tool, &profile.name));
    let body = if cfg!(windows) {
        format!(
            "@echo off\r\nrem {SHIM_MARKER}\r\n\"{authmux_bin}\" run {} \"{}\" -- %*\r\n",
            profile.tool, profile.name
        )
    } else {
        format!(
            "#!/bin/sh\n# {SHIM_MARKER}\nexec \"{authmux_bin}\" run {} \"{}\" -- \"$@\"\n",
            profile.tool, profile.name
        )
    };
    fs::write(&path, body)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms)?;
    }
    debug!("installed shim {}", path.display());
    Ok(path)
}

/// Remove one shim. A shim that is already gone is not an error.
pub fn remove(dir: &Path, tool: Tool, profile: &str) -> Result<()> {
    let path = dir.join(shim_name(tool, profile));
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Remove every marker-tagged shim in `dir`, leaving foreign files alone.
/// Returns the paths that were deleted.
pub fn remove_all(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(removed),
        Err(err) => return Err(err.into()),
    };
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Ok(body) = fs::read_to_string(&path) else {
            continue;
        };
        if body.contains(SHIM_MARKER) {
            fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    removed.sort();
    Ok(removed)
}

/// Install into the default directory with the best-guess binary path.
pub fn install_for_profile(profile: &Profile) -> Result<PathBuf> {
    let dir = default_shim_dir()?;
    install(&dir, profile, &resolve_authmux_bin())
}
