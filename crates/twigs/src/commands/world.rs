//! `twigs world`

use anyhow::Result;
use twigs_core::{CleanupReport, Navigation, staleness};

use super::Workspace;
use crate::shell;

/// Analyze, confirm and remove stale worktrees and branches
///
/// Exits with 1 when some confirmed removal failed. A shell started in the
/// main worktree replaces the process, so its exit status wins.
pub fn run_world(quiet: bool) -> Result<i32> {
    let workspace = Workspace::open(quiet)?;
    let report = staleness::world(&workspace.ctx, &workspace.vcs, &workspace.ui)?;
    finish(&report, shell::relocate)
}

/// Relocate out of any removed worktree, then report failures
fn finish(
    report: &CleanupReport,
    relocate: impl FnOnce(&Navigation) -> Result<()>,
) -> Result<i32> {
    relocate(&report.navigation)?;
    Ok(if report.failures.is_empty() { 0 } else { 1 })
}
