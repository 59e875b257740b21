//! Configuration handling for twigs
//!
//! Settings come from two optional TOML files, applied in order:
//! the user file (`$XDG_CONFIG_HOME/twigs/config.toml`) and the repository
//! file (`.twigs.toml` at the main worktree root). Later files override keys
//! from earlier ones; a missing file is the same as an empty one.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TwigsError;

/// File name of the per-repository override
pub const REPO_CONFIG_FILE: &str = ".twigs.toml";

/// Twigs configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub twigs: TwigsConfig,

    /// `twigs world` settings
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

/// Core twigs settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwigsConfig {
    /// Directory under the main worktree that holds generated worktrees
    #[serde(default = "default_worktree_dir")]
    pub worktree_dir: String,

    /// Branch names never deleted, on top of the default branch, main and master
    #[serde(default)]
    pub protected_branches: Vec<String>,

    /// Remote used for default-branch detection and pull request refs
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Editor command for the dashboard; falls back to $VISUAL / $EDITOR
    #[serde(default)]
    pub editor: Option<String>,

    /// Seconds the cleanup confirmation waits before giving up
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,

    /// Word list used for generated branch names
    #[serde(default = "default_words_file")]
    pub words_file: PathBuf,
}

/// Cleanup heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Treat never-pushed branches with no unique commits as abandoned
    #[serde(default = "default_true")]
    pub include_no_remote: bool,
}

fn default_worktree_dir() -> String {
    ".worktrees".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_confirm_timeout_secs() -> u64 {
    30
}

fn default_words_file() -> PathBuf {
    PathBuf::from("/usr/share/dict/words")
}

fn default_true() -> bool {
    true
}

impl Default for TwigsConfig {
    fn default() -> Self {
        Self {
            worktree_dir: default_worktree_dir(),
            protected_branches: Vec::new(),
            remote: default_remote(),
            editor: None,
            confirm_timeout_secs: default_confirm_timeout_secs(),
            words_file: default_words_file(),
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            include_no_remote: true,
        }
    }
}

impl Config {
    /// Config files consulted for a repository, lowest priority first
    pub fn search_paths(repo_root: &Path) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("twigs").join("config.toml"));
        }
        paths.push(repo_root.join(REPO_CONFIG_FILE));
        paths
    }

    /// Load and layer the standard config files for a repository
    pub fn load(repo_root: &Path) -> Result<Self, TwigsError> {
        Self::load_layers(&Self::search_paths(repo_root))
    }

    /// Load and layer the given files; missing files are skipped
    pub fn load_layers(paths: &[PathBuf]) -> Result<Self, TwigsError> {
        let mut merged = toml::Value::Table(toml::map::Map::new());

        for path in paths {
            if !path.is_file() {
                continue;
            }
            let content = fs::read_to_string(path)?;
            let layer: toml::Value = toml::from_str(&content)
                .map_err(|e| TwigsError::Config(format!("{}: {}", path.display(), e)))?;
            merge_values(&mut merged, layer);
        }

        merged
            .try_into()
            .map_err(|e: toml::de::Error| TwigsError::Config(e.to_string()))
    }

    /// Whether the configured protection list names this branch
    pub fn is_listed_protected(&self, branch: &str) -> bool {
        self.twigs.protected_branches.iter().any(|b| b == branch)
    }
}

fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
