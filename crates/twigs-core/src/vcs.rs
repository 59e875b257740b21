//! Version-control port and its git CLI implementation
//!
//! Every repository read or mutation goes through the `Vcs` trait. `GitCli`
//! shells out to `git -C <dir>`; tests substitute an in-memory fake.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::debug;

use crate::error::TwigsError;
use crate::types::InProgressOp;

/// How a new worktree gets its HEAD
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorktreeSource {
    /// Check out an existing local branch
    Existing { branch: String },
    /// Create a local branch tracking `remote_ref` (e.g. `origin/foo`)
    Track { branch: String, remote_ref: String },
    /// Create a new branch from `base`
    New { branch: String, base: String },
    /// Detached HEAD at `commitish`
    Detached { commitish: String },
}

impl WorktreeSource {
    /// Branch that will be checked out, if any
    pub fn branch(&self) -> Option<&str> {
        match self {
            WorktreeSource::Existing { branch }
            | WorktreeSource::Track { branch, .. }
            | WorktreeSource::New { branch, .. } => Some(branch),
            WorktreeSource::Detached { .. } => None,
        }
    }
}

/// Repository operations used by twigs
pub trait Vcs {
    /// Raw `git worktree list --porcelain` output
    fn worktree_list(&self) -> Result<String, TwigsError>;

    /// Human-readable `git worktree list` output
    fn worktree_list_human(&self) -> Result<String, TwigsError>;

    /// Absolute path of the shared git dir
    fn common_dir(&self) -> Result<PathBuf, TwigsError>;

    /// Target of a symbolic ref, e.g. `refs/remotes/origin/HEAD`
    fn symbolic_ref(&self, name: &str) -> Option<String>;

    fn config_value(&self, key: &str) -> Option<String>;

    /// Whether a fully-qualified ref (`refs/heads/x`) resolves
    fn ref_exists(&self, refname: &str) -> bool;

    /// Short names of local branches
    fn local_branches(&self) -> Result<Vec<String>, TwigsError>;

    /// Short names of remote-tracking branches (`origin/foo`), without `*/HEAD`
    fn remote_branches(&self) -> Result<Vec<String>, TwigsError>;

    /// Fully-qualified upstream ref configured for a branch
    fn upstream_ref(&self, branch: &str) -> Option<String>;

    /// Commits (ahead, behind) of `branch` relative to `base`
    fn ahead_behind(&self, branch: &str, base: &str) -> Result<(usize, usize), TwigsError>;

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool;

    fn worktree_add(&self, path: &Path, source: &WorktreeSource) -> Result<(), TwigsError>;

    fn worktree_remove(&self, path: &Path, force: bool) -> Result<(), TwigsError>;

    fn worktree_move(&self, from: &Path, to: &Path) -> Result<(), TwigsError>;

    fn worktree_prune(&self) -> Result<(), TwigsError>;

    /// `git branch -d` or `-D`
    fn branch_delete(&self, branch: &str, force: bool) -> Result<(), TwigsError>;

    fn branch_rename(&self, old: &str, new: &str) -> Result<(), TwigsError>;

    /// Switch the worktree at `worktree` to `branch`
    fn switch(&self, worktree: &Path, branch: &str) -> Result<(), TwigsError>;

    /// Refresh every remote and prune deleted remote branches
    fn fetch_all(&self) -> Result<(), TwigsError>;

    /// Fetch `pull/<number>/head` from `remote` into local `branch`
    fn fetch_pull_ref(
        &self,
        worktree: &Path,
        remote: &str,
        number: u64,
        branch: &str,
    ) -> Result<(), TwigsError>;

    /// Number of changed or untracked paths in a worktree
    fn change_count(&self, worktree: &Path) -> Result<usize, TwigsError>;

    fn in_progress(&self, worktree: &Path) -> Option<InProgressOp>;

    /// (ahead, behind) of the worktree's HEAD against its upstream
    fn upstream_sync(&self, worktree: &Path) -> Option<(usize, usize)>;
}

/// Git CLI wrapper for worktree operations
pub struct GitCli {
    dir: PathBuf,
}

impl GitCli {
    /// Run git commands from `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Check if git version is sufficient (2.17+, for `worktree move`)
    pub fn check_git_version(&self) -> Result<bool, TwigsError> {
        let output = Command::new("git").arg("--version").output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TwigsError::GitNotInstalled
            } else {
                TwigsError::Io(e)
            }
        })?;

        if !output.status.success() {
            return Ok(false);
        }

        let version_str = String::from_utf8_lossy(&output.stdout);
        Ok(parse_git_version(&version_str)
            .map(|(major, minor)| major > 2 || (major == 2 && minor >= 17))
            .unwrap_or(false))
    }

    fn command_in(&self, dir: &Path, args: &[&str]) -> Result<Output, TwigsError> {
        debug!(dir = %dir.display(), "git {}", args.join(" "));
        Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TwigsError::GitNotInstalled
                } else {
                    TwigsError::Io(e)
                }
            })
    }

    /// Run in `dir` and return trimmed stdout, failing on a non-zero exit
    fn run_in(&self, dir: &Path, args: &[&str]) -> Result<String, TwigsError> {
        let output = self.command_in(dir, args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("not a git repository") {
                return Err(TwigsError::NotAGitRepository);
            }
            return Err(TwigsError::GitCommand {
                args: args.join(" "),
                stderr,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    fn run(&self, args: &[&str]) -> Result<String, TwigsError> {
        self.run_in(&self.dir, args)
    }

    fn succeeds(&self, args: &[&str]) -> bool {
        self.command_in(&self.dir, args)
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn optional(&self, args: &[&str]) -> Option<String> {
        self.run(args).ok().filter(|s| !s.trim().is_empty())
    }
}

impl Vcs for GitCli {
    fn worktree_list(&self) -> Result<String, TwigsError> {
        self.run(&["worktree", "list", "--porcelain"])
    }

    fn worktree_list_human(&self) -> Result<String, TwigsError> {
        self.run(&["worktree", "list"])
    }

    fn common_dir(&self) -> Result<PathBuf, TwigsError> {
        let raw = self.run(&["rev-parse", "--git-common-dir"])?;
        let path = PathBuf::from(raw.trim());
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(self.dir.join(path))
        }
    }

    fn symbolic_ref(&self, name: &str) -> Option<String> {
        self.optional(&["symbolic-ref", "--quiet", name])
    }

    fn config_value(&self, key: &str) -> Option<String> {
        self.optional(&["config", "--get", key])
            .map(|value| value.trim().to_string())
    }

    fn ref_exists(&self, refname: &str) -> bool {
        self.succeeds(&["show-ref", "--verify", "--quiet", refname])
    }

    fn local_branches(&self) -> Result<Vec<String>, TwigsError> {
        let out = self.run(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn remote_branches(&self) -> Result<Vec<String>, TwigsError> {
        let out = self.run(&["for-each-ref", "--format=%(refname)", "refs/remotes"])?;
        Ok(out
            .lines()
            .filter_map(|l| l.trim().strip_prefix("refs/remotes/"))
            .filter(|name| name.contains('/') && !name.ends_with("/HEAD"))
            .map(str::to_string)
            .collect())
    }

    fn upstream_ref(&self, branch: &str) -> Option<String> {
        let refname = format!("refs/heads/{}", branch);
        self.optional(&["for-each-ref", "--format=%(upstream)", &refname])
            .map(|value| value.trim().to_string())
    }

    fn ahead_behind(&self, branch: &str, base: &str) -> Result<(usize, usize), TwigsError> {
        let range = format!("{}...{}", branch, base);
        let out = self.run(&["rev-list", "--left-right", "--count", &range])?;
        parse_left_right(&out).ok_or_else(|| TwigsError::GitCommand {
            args: format!("rev-list --left-right --count {}", range),
            stderr: format!("unexpected output: {}", out),
        })
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        self.succeeds(&["merge-base", "--is-ancestor", ancestor, descendant])
    }

    fn worktree_add(&self, path: &Path, source: &WorktreeSource) -> Result<(), TwigsError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| TwigsError::WorktreeCreationFailed {
                reason: format!("worktree path is not valid UTF-8: {}", path.display()),
            })?;

        let mut args = vec!["worktree", "add"];
        match source {
            WorktreeSource::Existing { branch } => {
                args.extend([path_str, branch.as_str()]);
            }
            WorktreeSource::Track { branch, remote_ref } => {
                args.extend(["--track", "-b", branch.as_str(), path_str, remote_ref.as_str()]);
            }
            WorktreeSource::New { branch, base } => {
                args.extend(["-b", branch.as_str(), path_str, base.as_str()]);
            }
            WorktreeSource::Detached { commitish } => {
                args.extend(["--detach", path_str, commitish.as_str()]);
            }
        }
        self.run(&args).map(|_| ())
    }

    fn worktree_remove(&self, path: &Path, force: bool) -> Result<(), TwigsError> {
        let path_str = path.to_string_lossy();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&path_str);
        self.run(&args).map(|_| ())
    }

    fn worktree_move(&self, from: &Path, to: &Path) -> Result<(), TwigsError> {
        let from = from.to_string_lossy();
        let to = to.to_string_lossy();
        self.run(&["worktree", "move", &from, &to]).map(|_| ())
    }

    fn worktree_prune(&self) -> Result<(), TwigsError> {
        self.run(&["worktree", "prune"]).map(|_| ())
    }

    fn branch_delete(&self, branch: &str, force: bool) -> Result<(), TwigsError> {
        let flag = if force { "-D" } else { "-d" };
        self.run(&["branch", flag, branch]).map(|_| ())
    }

    fn branch_rename(&self, old: &str, new: &str) -> Result<(), TwigsError> {
        self.run(&["branch", "-m", old, new]).map(|_| ())
    }

    fn switch(&self, worktree: &Path, branch: &str) -> Result<(), TwigsError> {
        self.run_in(worktree, &["switch", branch]).map(|_| ())
    }

    fn fetch_all(&self) -> Result<(), TwigsError> {
        self.run(&["fetch", "--all", "--prune", "--quiet"]).map(|_| ())
    }

    fn fetch_pull_ref(
        &self,
        worktree: &Path,
        remote: &str,
        number: u64,
        branch: &str,
    ) -> Result<(), TwigsError> {
        let refspec = format!("+pull/{}/head:{}", number, branch);
        self.run_in(worktree, &["fetch", remote, &refspec]).map(|_| ())
    }

    fn change_count(&self, worktree: &Path) -> Result<usize, TwigsError> {
        let out = self.run_in(worktree, &["status", "--porcelain"])?;
        Ok(out.lines().filter(|l| !l.trim().is_empty()).count())
    }

    fn in_progress(&self, worktree: &Path) -> Option<InProgressOp> {
        let git_dir = self
            .run_in(worktree, &["rev-parse", "--absolute-git-dir"])
            .ok()?;
        InProgressOp::detect(Path::new(git_dir.trim()))
    }

    fn upstream_sync(&self, worktree: &Path) -> Option<(usize, usize)> {
        let out = self
            .run_in(
                worktree,
                &["rev-list", "--left-right", "--count", "HEAD...@{upstream}"],
            )
            .ok()?;
        parse_left_right(&out)
    }
}

/// Parse "git version 2.39.0" into (major, minor)
fn parse_git_version(version: &str) -> Option<(u32, u32)> {
    let number = version.split_whitespace().nth(2)?;
    let mut parts = number.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}

/// Parse `rev-list --left-right --count` output ("3\t1")
fn parse_left_right(output: &str) -> Option<(usize, usize)> {
    let mut parts = output.split_whitespace();
    let left = parts.next()?.parse().ok()?;
    let right = parts.next()?.parse().ok()?;
    Some((left, right))
}
