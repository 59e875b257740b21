//! `twigs goto` and `twigs cd`

use anyhow::Result;
use twigs_core::Navigation;

use super::Workspace;
use crate::shell;

/// Print the resolved worktree's absolute path on stdout
pub fn run_goto(pattern: Option<String>, quiet: bool) -> Result<i32> {
    let workspace = Workspace::open(quiet)?;
    let worktree = workspace.manager().locate(pattern.as_deref())?;
    println!("{}", worktree.path.display());
    Ok(0)
}

/// Relocate into the resolved worktree
pub fn run_cd(pattern: Option<String>, quiet: bool) -> Result<i32> {
    let workspace = Workspace::open(quiet)?;
    let worktree = workspace.manager().locate(pattern.as_deref())?;
    shell::relocate(&Navigation::To(worktree.path))?;
    Ok(0)
}
