//! `twigs tui`

use anyhow::Result;
use twigs_core::Dashboard;

use super::Workspace;
use crate::launcher::SystemLauncher;
use crate::shell;

/// Run the dashboard until it quits or relocates
pub fn run_tui(quiet: bool) -> Result<i32> {
    let workspace = Workspace::open(quiet)?;
    let manager = workspace.manager();
    let launcher = SystemLauncher::new(workspace.ctx.config.twigs.editor.as_deref());
    let navigation = Dashboard::new(&manager, &launcher).run()?;
    shell::relocate(&navigation)?;
    Ok(0)
}
