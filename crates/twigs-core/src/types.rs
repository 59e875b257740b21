//! Core data types: worktrees, derived status, removal candidates, navigation

use std::fmt;
use std::path::{Path, PathBuf};

/// One entry of the worktree registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worktree {
    /// Absolute path of the working directory
    pub path: PathBuf,
    /// Short branch name; `None` when HEAD is detached
    pub branch: Option<String>,
    /// Commit checked out, when git reported one
    pub head: Option<String>,
    /// The original working directory of the repository
    pub is_main: bool,
    pub is_bare: bool,
    /// git flagged the worktree as prunable (its directory is gone)
    pub prunable: bool,
}

impl Worktree {
    /// Branch name, or a placeholder for detached worktrees
    pub fn branch_label(&self) -> &str {
        self.branch.as_deref().unwrap_or("(detached)")
    }

    /// Path relative to `root` when it lives underneath it
    pub fn display_path(&self, root: &Path) -> String {
        if self.path == root {
            return self
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string());
        }
        match self.path.strip_prefix(root) {
            Ok(relative) => relative.display().to_string(),
            Err(_) => self.path.display().to_string(),
        }
    }

    /// Whether `dir` is this worktree or somewhere inside it
    pub fn contains(&self, dir: &Path) -> bool {
        dir.starts_with(&self.path)
    }
}

/// Operation in progress inside a worktree, detected from git's marker files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InProgressOp {
    Rebasing,
    Merging,
    CherryPicking,
    Reverting,
    Bisecting,
}

impl InProgressOp {
    /// Detection order; rebases can leave cherry-pick markers behind
    pub const ALL: [InProgressOp; 5] = [
        InProgressOp::Rebasing,
        InProgressOp::Merging,
        InProgressOp::CherryPicking,
        InProgressOp::Reverting,
        InProgressOp::Bisecting,
    ];

    /// Entries under the git dir whose presence means this operation is active
    pub fn markers(self) -> &'static [&'static str] {
        match self {
            InProgressOp::Rebasing => &["rebase-merge", "rebase-apply"],
            InProgressOp::Merging => &["MERGE_HEAD"],
            InProgressOp::CherryPicking => &["CHERRY_PICK_HEAD"],
            InProgressOp::Reverting => &["REVERT_HEAD"],
            InProgressOp::Bisecting => &["BISECT_LOG"],
        }
    }

    /// Evaluate the predicate against a worktree's git dir
    pub fn detect(git_dir: &Path) -> Option<InProgressOp> {
        Self::ALL.into_iter().find(|op| {
            op.markers()
                .iter()
                .any(|marker| git_dir.join(marker).exists())
        })
    }
}

impl fmt::Display for InProgressOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InProgressOp::Rebasing => write!(f, "rebasing"),
            InProgressOp::Merging => write!(f, "merging"),
            InProgressOp::CherryPicking => write!(f, "cherry-picking"),
            InProgressOp::Reverting => write!(f, "reverting"),
            InProgressOp::Bisecting => write!(f, "bisecting"),
        }
    }
}

/// Derived working-tree status column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorktreeStatus {
    Clean,
    Changes { count: usize },
    InProgress { op: InProgressOp },
    Missing,
}

impl fmt::Display for WorktreeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorktreeStatus::Clean => write!(f, "clean"),
            WorktreeStatus::Changes { count: 1 } => write!(f, "1 change"),
            WorktreeStatus::Changes { count } => write!(f, "{} changes", count),
            WorktreeStatus::InProgress { op } => write!(f, "{}", op),
            WorktreeStatus::Missing => write!(f, "missing"),
        }
    }
}

/// Derived upstream sync column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    NoUpstream,
    Synced,
    Diverged { ahead: usize, behind: usize },
}

impl SyncState {
    pub fn from_counts(counts: Option<(usize, usize)>) -> Self {
        match counts {
            None => SyncState::NoUpstream,
            Some((0, 0)) => SyncState::Synced,
            Some((ahead, behind)) => SyncState::Diverged { ahead, behind },
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::NoUpstream => write!(f, "-"),
            SyncState::Synced => write!(f, "synced"),
            SyncState::Diverged { ahead, behind } => {
                let mut parts = Vec::new();
                if *ahead > 0 {
                    parts.push(format!("↑{}", ahead));
                }
                if *behind > 0 {
                    parts.push(format!("↓{}", behind));
                }
                write!(f, "{}", parts.join(" "))
            }
        }
    }
}

/// Why something was judged safe to remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Configured upstream no longer resolves
    UpstreamGone,
    /// Never pushed anywhere
    NoRemote,
    /// Fully contained in the default branch
    Merged,
}

impl RemovalReason {
    /// Whether the branch delete must skip git's ancestry check
    ///
    /// Only `Merged` is justified by ancestry; the other reasons rest on the
    /// absence of a remote, so a safe delete would refuse them.
    pub fn needs_forced_delete(self) -> bool {
        !matches!(self, RemovalReason::Merged)
    }
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalReason::UpstreamGone => write!(f, "upstream gone"),
            RemovalReason::NoRemote => write!(f, "no remote"),
            RemovalReason::Merged => write!(f, "merged"),
        }
    }
}

/// What a removal candidate points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateTarget {
    Worktree(Worktree),
    Branch { name: String },
}

/// Output of the staleness analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalCandidate {
    pub target: CandidateTarget,
    pub reason: RemovalReason,
}

impl RemovalCandidate {
    pub fn branch_name(&self) -> Option<&str> {
        match &self.target {
            CandidateTarget::Worktree(worktree) => worktree.branch.as_deref(),
            CandidateTarget::Branch { name } => Some(name),
        }
    }
}

/// Where the caller should end up once an operation finishes
///
/// The core never changes directories itself. A `To` value is handed to the
/// binary, which replaces the process with a shell rooted there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    To(PathBuf),
}

/// Result of a create/move style operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub path: PathBuf,
    pub branch: Option<String>,
    pub navigation: Navigation,
}
