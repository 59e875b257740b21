//! `twigs add`

use std::path::PathBuf;

use anyhow::Result;
use twigs_core::{AddRequest, InteractionAdapter};

use super::Workspace;
use crate::shell;

/// Run the add command
pub fn run_add(
    branch: Option<String>,
    path: Option<PathBuf>,
    no_cd: bool,
    current_branch: bool,
    quiet: bool,
) -> Result<i32> {
    let workspace = Workspace::open(quiet)?;
    let manager = workspace.manager();
    let outcome = manager.add(&AddRequest {
        branch,
        path,
        from_current: current_branch,
        no_cd,
    })?;

    workspace.ui.print_success(&format!(
        "Created worktree {} on {}",
        outcome.path.display(),
        outcome.branch.as_deref().unwrap_or("(detached)")
    ));
    shell::relocate(&outcome.navigation)?;
    Ok(0)
}
