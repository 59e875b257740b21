//! `twigs move`

use std::path::PathBuf;

use anyhow::Result;
use twigs_core::{InteractionAdapter, MoveRequest};

use super::Workspace;
use crate::shell;

/// Move a worktree, or extract the main worktree's branch
pub fn run_move(
    worktree: Option<String>,
    dest: Option<PathBuf>,
    no_cd: bool,
    quiet: bool,
) -> Result<i32> {
    let workspace = Workspace::open(quiet)?;
    let outcome = workspace.manager().move_worktree(&MoveRequest {
        query: worktree,
        dest,
        no_cd,
    })?;

    workspace.ui.print_success(&format!(
        "{} is now at {}",
        outcome.branch.as_deref().unwrap_or("(detached)"),
        outcome.path.display()
    ));
    shell::relocate(&outcome.navigation)?;
    Ok(0)
}
