//! CLI command implementations
//!
//! Each command opens a `Workspace` (repository context plus the real
//! ports), runs one core operation, and hands any resulting navigation to the
//! shell module.

pub mod add;
pub mod checkout;
pub mod list;
pub mod move_worktree;
pub mod navigate;
pub mod remove;
pub mod tui;
pub mod world;

use anyhow::{Context, Result};
use twigs_core::{GhCli, GitCli, Manager, RepoContext, TwigsError};

use crate::interaction::CliAdapter;

pub use add::run_add;
pub use checkout::run_checkout_pr;
pub use list::{run_list, run_prune};
pub use move_worktree::run_move;
pub use navigate::{run_cd, run_goto};
pub use remove::run_remove;
pub use tui::run_tui;
pub use world::run_world;

/// The repository the command runs against and the ports bound to it
pub struct Workspace {
    pub ctx: RepoContext,
    pub vcs: GitCli,
    pub hosting: GhCli,
    pub ui: CliAdapter,
}

impl Workspace {
    /// Discover the repository around the current directory
    pub fn open(quiet: bool) -> Result<Self> {
        let cwd = std::env::current_dir().context("cannot read the current directory")?;
        let probe = GitCli::new(&cwd);
        if !probe.check_git_version()? {
            return Err(TwigsError::GitVersionInsufficient.into());
        }
        let ctx = RepoContext::discover(&probe, &cwd)?;
        let vcs = GitCli::new(&ctx.repo_root);
        let hosting = GhCli::new(&ctx.repo_root);
        Ok(Self {
            ctx,
            vcs,
            hosting,
            ui: CliAdapter::new(quiet),
        })
    }

    pub fn manager(&self) -> Manager<'_> {
        Manager::new(&self.ctx, &self.vcs, &self.hosting, &self.ui)
    }
}
