use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::errors::{Error, Result};

pub const STATE_VERSION: u32 = 1;

/// The closed set of external tools authmux can wrap. Not user-extensible.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Claude,
    Codex,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::Claude, Tool::Codex];

    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Claude => "claude",
            Tool::Codex => "codex",
        }
    }

    /// Parse a user-supplied tool name, case- and whitespace-insensitively.
    pub fn parse(raw: &str) -> Result<Tool> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "claude" => Ok(Tool::Claude),
            "codex" => Ok(Tool::Codex),
            _ => Err(Error::UnsupportedTool(raw.to_string())),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn profile_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]{0,63}$").expect("profile name pattern")
    })
}

/// Profile names double as directory and shim-launcher names, so the pattern
/// keeps them path- and shell-safe.
pub fn validate_profile_name(name: &str) -> Result<()> {
    if profile_name_pattern().is_match(name) {
        Ok(())
    } else {
        Err(Error::InvalidName {
            name: name.to_string(),
        })
    }
}

/// A named, tool-scoped identity backed by its own private config directory.
///
/// `dir` is always derived from `(root, tool, name)`; it is stored for
/// convenience, never set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub tool: Tool,
    pub name: String,
    pub dir: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// The persisted registry: every profile plus the per-tool default pointers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryState {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub defaults: BTreeMap<Tool, String>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl RegistryState {
    /// A fresh, empty registry. An uninitialized root is a valid registry,
    /// not an error.
    pub fn empty() -> Self {
        RegistryState {
            version: STATE_VERSION,
            defaults: BTreeMap::new(),
            profiles: Vec::new(),
        }
    }

    /// Re-establish the invariants every caller may rely on: version pinned
    /// and profiles sorted by `(tool, name)` for deterministic iteration.
    pub fn normalize(&mut self) {
        if self.version == 0 {
            self.version = STATE_VERSION;
        }
        self.profiles
            .sort_by(|a, b| a.tool.cmp(&b.tool).then_with(|| a.name.cmp(&b.name)));
    }

    pub fn find(&self, tool: Tool, name: &str) -> Option<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.tool == tool && p.name == name)
    }

    pub fn find_index(&self, tool: Tool, name: &str) -> Option<usize> {
        self.profiles
            .iter()
            .position(|p| p.tool == tool && p.name == name)
    }

    /// The default profile name for a tool, if one is set and non-empty.
    pub fn default_for(&self, tool: Tool) -> Option<&str> {
        self.defaults
            .get(&tool)
            .map(String::as_str)
            .filter(|name| !name.trim().is_empty())
    }

    pub fn profiles_for(&self, tool: Tool) -> impl Iterator<Item = &Profile> {
        self.profiles.iter().filter(move |p| p.tool == tool)
    }
}

impl Default for RegistryState {
    fn default() -> Self {
        Self::empty()
    }
}
