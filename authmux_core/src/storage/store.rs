use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use log::debug;

use crate::core::errors::{Error, Result};
use crate::storage::state::{RegistryState, Tool, STATE_VERSION};

const STATE_FILE_NAME: &str = "state.json";

/// Overrides the default `<home>/.authmux` root when set.
pub const ROOT_ENV_VAR: &str = "AUTHMUX_HOME";

/// Owner of the on-disk registry document. The store is the only component
/// that knows the registry file's path.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    root: PathBuf,
}

/// `$AUTHMUX_HOME` if set, otherwise `~/.authmux`.
pub fn default_root() -> Result<PathBuf> {
    if let Ok(custom) = env::var(ROOT_ENV_VAR) {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    let base = BaseDirs::new().ok_or_else(|| {
        Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "unable to locate home directory",
        ))
    })?;
    Ok(base.home_dir().join(".authmux"))
}

/// Backing directory for a profile: `<root>/profiles/<tool>/<name>`.
pub fn profile_dir(root: &Path, tool: Tool, name: &str) -> PathBuf {
    root.join("profiles").join(tool.as_str()).join(name)
}

impl RegistryStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "store root cannot be empty",
            )));
        }
        fs::create_dir_all(&root)?;
        Ok(RegistryStore { root })
    }

    pub fn open_default() -> Result<Self> {
        Self::new(default_root()?)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn state_path(&self) -> PathBuf {
        self.root.join(STATE_FILE_NAME)
    }

    /// Read the registry. A missing file is an empty registry; a present but
    /// unparseable file is `CorruptState`. The returned state is normalized.
    pub fn load(&self) -> Result<RegistryState> {
        let path = self.state_path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no registry at {}; starting empty", path.display());
                return Ok(RegistryState::empty());
            }
            Err(err) => return Err(err.into()),
        };
        let mut state: RegistryState =
            serde_json::from_str(&raw).map_err(|source| Error::CorruptState { path, source })?;
        state.normalize();
        Ok(state)
    }

    /// Persist the registry: normalized, version pinned, pretty-printed with
    /// a trailing newline, written to a temp file and renamed into place so a
    /// concurrent reader never observes a half-written document.
    ///
    /// There is no cross-process lock. Two concurrent invocations against the
    /// same root race at whole-file granularity and the later save wins.
    pub fn save(&self, state: &RegistryState) -> Result<()> {
        let mut state = state.clone();
        state.normalize();
        state.version = STATE_VERSION;

        let mut body = serde_json::to_string_pretty(&state)?;
        body.push('\n');

        let path = self.state_path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)?;
        debug!(
            "saved registry ({} profile(s)) to {}",
            state.profiles.len(),
            path.display()
        );
        Ok(())
    }
}
