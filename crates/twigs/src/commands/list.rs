//! `twigs list` and `twigs prune`: thin wrappers over git

use anyhow::Result;
use twigs_core::{InteractionAdapter, Vcs};

use super::Workspace;

/// Print `git worktree list` on stdout
pub fn run_list(quiet: bool) -> Result<i32> {
    let workspace = Workspace::open(quiet)?;
    print!("{}", workspace.vcs.worktree_list_human()?);
    Ok(0)
}

/// Run `git worktree prune`
pub fn run_prune(quiet: bool) -> Result<i32> {
    let workspace = Workspace::open(quiet)?;
    workspace.vcs.worktree_prune()?;
    workspace.ui.print_success("Pruned stale worktree entries");
    Ok(0)
}
