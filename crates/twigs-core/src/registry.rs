//! Worktree registry: parses git's porcelain listing into `Worktree` records

use std::path::{Path, PathBuf};

use crate::error::TwigsError;
use crate::types::Worktree;
use crate::vcs::Vcs;

/// Parse `git worktree list --porcelain` output
///
/// Records are blank-line separated. A record starts at its `worktree` line;
/// the first record is the main worktree. Bare entries are dropped after the
/// main flag has been assigned, so a bare main leaves no main in the result.
pub fn parse_porcelain(output: &str) -> Vec<Worktree> {
    let mut records: Vec<Worktree> = Vec::new();
    let mut current: Option<Worktree> = None;

    for line in output.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if let Some(record) = current.take() {
                records.push(record);
            }
            continue;
        }

        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(record) = current.take() {
                records.push(record);
            }
            current = Some(Worktree {
                path: PathBuf::from(path),
                branch: None,
                head: None,
                is_main: records.is_empty(),
                is_bare: false,
                prunable: false,
            });
            continue;
        }

        let Some(record) = current.as_mut() else {
            continue;
        };

        if let Some(head) = line.strip_prefix("HEAD ") {
            record.head = Some(head.to_string());
        } else if let Some(branch) = line.strip_prefix("branch ") {
            let short = branch.strip_prefix("refs/heads/").unwrap_or(branch);
            record.branch = Some(short.to_string());
        } else if line == "bare" {
            record.is_bare = true;
        } else if line == "detached" {
            record.branch = None;
        } else if line == "prunable" || line.starts_with("prunable ") {
            record.prunable = true;
        }
    }

    if let Some(record) = current.take() {
        records.push(record);
    }

    records.into_iter().filter(|w| !w.is_bare).collect()
}

/// Read the registry fresh from the repository
pub fn read_worktrees(vcs: &dyn Vcs) -> Result<Vec<Worktree>, TwigsError> {
    Ok(parse_porcelain(&vcs.worktree_list()?))
}

/// The main worktree of a registry
pub fn main_worktree(worktrees: &[Worktree]) -> Result<&Worktree, TwigsError> {
    worktrees
        .iter()
        .find(|w| w.is_main)
        .ok_or(TwigsError::NoMainWorktree)
}

/// Innermost worktree containing `dir`
///
/// Linked worktrees usually live inside the main one, so the longest matching
/// path wins.
pub fn worktree_containing<'a>(worktrees: &'a [Worktree], dir: &Path) -> Option<&'a Worktree> {
    worktrees
        .iter()
        .filter(|w| w.contains(dir))
        .max_by_key(|w| w.path.components().count())
}

/// Worktree that has `branch` checked out
pub fn worktree_for_branch<'a>(worktrees: &'a [Worktree], branch: &str) -> Option<&'a Worktree> {
    worktrees
        .iter()
        .find(|w| w.branch.as_deref() == Some(branch))
}
