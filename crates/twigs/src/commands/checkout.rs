//! `twigs checkout` and `twigs pr co`

use anyhow::Result;
use twigs_core::InteractionAdapter;

use super::Workspace;
use crate::shell;

/// Check out a pull request into its conventional worktree
pub fn run_checkout_pr(reference: &str, no_cd: bool, quiet: bool) -> Result<i32> {
    let workspace = Workspace::open(quiet)?;
    let outcome = workspace.manager().checkout_pr(reference, no_cd)?;

    workspace.ui.print_success(&format!(
        "Pull request ready at {} ({})",
        outcome.path.display(),
        outcome.branch.as_deref().unwrap_or("(detached)")
    ));
    shell::relocate(&outcome.navigation)?;
    Ok(0)
}
