//! `twigs remove`

use anyhow::Result;

use super::Workspace;
use crate::shell;

/// Remove a worktree (the caller's own when no target is given)
pub fn run_remove(target: Option<String>, force: bool, quiet: bool) -> Result<i32> {
    let workspace = Workspace::open(quiet)?;
    let outcome = workspace.manager().remove(target.as_deref(), force)?;
    shell::relocate(&outcome.navigation())?;
    Ok(0)
}
