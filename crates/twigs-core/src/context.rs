//! Explicit repository context threaded through every operation

use std::cell::OnceCell;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::error::TwigsError;
use crate::registry;
use crate::vcs::Vcs;

/// Branch names that were historically the default, always protected
pub const HISTORICAL_DEFAULT_BRANCHES: [&str; 2] = ["main", "master"];

/// Everything an operation needs to know about where it runs
#[derive(Debug)]
pub struct RepoContext {
    /// Main worktree path; generated worktrees live under it
    pub repo_root: PathBuf,
    /// Shared git dir (holds `info/exclude`)
    pub common_dir: PathBuf,
    /// Directory the caller invoked us from
    pub cwd: PathBuf,
    pub default_branch: String,
    /// OS login, last resort for the identity chain
    pub os_user: Option<String>,
    pub config: Config,
    identity: OnceCell<String>,
}

impl RepoContext {
    pub fn new(
        repo_root: PathBuf,
        common_dir: PathBuf,
        cwd: PathBuf,
        default_branch: String,
        config: Config,
    ) -> Self {
        Self {
            repo_root,
            common_dir,
            cwd,
            default_branch,
            os_user: None,
            config,
            identity: OnceCell::new(),
        }
    }

    pub fn with_os_user(mut self, user: Option<String>) -> Self {
        self.os_user = user;
        self
    }

    /// Build the context for the repository containing `cwd`
    ///
    /// Fails with `NotAGitRepository` before anything else runs when `cwd` is
    /// outside a repository.
    pub fn discover(vcs: &dyn Vcs, cwd: &Path) -> Result<Self, TwigsError> {
        let cwd = cwd.canonicalize().unwrap_or_else(|_| cwd.to_path_buf());
        let worktrees = registry::read_worktrees(vcs)?;
        let main = registry::main_worktree(&worktrees)?;
        let config = Config::load(&main.path)?;
        let common_dir = vcs.common_dir()?;
        let default_branch = detect_default_branch(vcs, &config.twigs.remote);
        let os_user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok()
            .filter(|u| !u.trim().is_empty());

        debug!(
            repo_root = %main.path.display(),
            default_branch = %default_branch,
            "discovered repository"
        );

        Ok(Self::new(
            main.path.clone(),
            common_dir,
            cwd,
            default_branch,
            config,
        )
        .with_os_user(os_user))
    }

    /// Default branch, historical defaults, and configured names
    pub fn is_protected(&self, branch: &str) -> bool {
        branch == self.default_branch
            || HISTORICAL_DEFAULT_BRANCHES.contains(&branch)
            || self.config.is_listed_protected(branch)
    }

    /// Directory that holds generated worktrees
    pub fn worktree_root(&self) -> PathBuf {
        self.repo_root.join(&self.config.twigs.worktree_dir)
    }

    /// Resolve a user-supplied path against the caller's directory
    pub fn absolutize(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        };
        normalize_lexically(&joined)
    }

    /// Identity seeding generated branch names, resolved at most once
    pub fn identity_or_init(&self, init: impl FnOnce() -> String) -> &str {
        self.identity.get_or_init(init)
    }
}

/// Default branch: the remote's HEAD, else local main, else master
pub fn detect_default_branch(vcs: &dyn Vcs, remote: &str) -> String {
    let remote_head = format!("refs/remotes/{}/HEAD", remote);
    let prefix = format!("refs/remotes/{}/", remote);
    let from_remote = vcs
        .symbolic_ref(&remote_head)
        .and_then(|target| target.trim().strip_prefix(&prefix).map(str::to_string));
    if let Some(branch) = from_remote {
        return branch;
    }

    for candidate in HISTORICAL_DEFAULT_BRANCHES {
        if vcs.ref_exists(&format!("refs/heads/{}", candidate)) {
            return candidate.to_string();
        }
    }

    HISTORICAL_DEFAULT_BRANCHES[0].to_string()
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
