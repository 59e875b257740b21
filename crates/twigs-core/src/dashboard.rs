//! Interactive dashboard: a live worktree table plus an action loop
//!
//! Each iteration re-reads the registry, derives the status and sync columns,
//! asks for one action, and delegates to the lifecycle operations. An action
//! either loops back to a fresh render or ends the session with a
//! `Navigation`.

use std::path::Path;

use tracing::debug;

use crate::context::RepoContext;
use crate::error::TwigsError;
use crate::interaction::InteractionError;
use crate::lifecycle::{AddRequest, Manager, MoveRequest};
use crate::registry;
use crate::staleness;
use crate::types::{Navigation, SyncState, Worktree, WorktreeStatus};
use crate::vcs::Vcs;

/// External programs the dashboard can hand a worktree to
pub trait Launcher {
    fn open_editor(&self, path: &Path) -> Result<(), TwigsError>;

    fn show_diff(&self, path: &Path) -> Result<(), TwigsError>;
}

/// Fixed dashboard action set, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardAction {
    NewWorktree,
    CheckoutBranch,
    CheckoutPr,
    Switch,
    OpenEditor,
    ShowDiff,
    Move,
    Remove,
    BatchClean,
    Refresh,
    Quit,
}

impl DashboardAction {
    pub const ALL: [DashboardAction; 11] = [
        DashboardAction::NewWorktree,
        DashboardAction::CheckoutBranch,
        DashboardAction::CheckoutPr,
        DashboardAction::Switch,
        DashboardAction::OpenEditor,
        DashboardAction::ShowDiff,
        DashboardAction::Move,
        DashboardAction::Remove,
        DashboardAction::BatchClean,
        DashboardAction::Refresh,
        DashboardAction::Quit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DashboardAction::NewWorktree => "New worktree",
            DashboardAction::CheckoutBranch => "Checkout existing branch",
            DashboardAction::CheckoutPr => "Checkout pull request",
            DashboardAction::Switch => "Switch to worktree",
            DashboardAction::OpenEditor => "Open in editor",
            DashboardAction::ShowDiff => "Show diff",
            DashboardAction::Move => "Move worktree",
            DashboardAction::Remove => "Remove worktree",
            DashboardAction::BatchClean => "Clean up stale worktrees and branches",
            DashboardAction::Refresh => "Refresh",
            DashboardAction::Quit => "Quit",
        }
    }
}

/// One rendered worktree with its derived columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRow {
    pub worktree: Worktree,
    pub status: WorktreeStatus,
    pub sync: SyncState,
    /// The caller is inside this worktree
    pub current: bool,
}

/// Missing, then an in-progress operation, then the change count
pub fn derive_status(vcs: &dyn Vcs, worktree: &Worktree) -> WorktreeStatus {
    if worktree.prunable || !worktree.path.is_dir() {
        return WorktreeStatus::Missing;
    }
    if let Some(op) = vcs.in_progress(&worktree.path) {
        return WorktreeStatus::InProgress { op };
    }
    match vcs.change_count(&worktree.path) {
        Ok(0) => WorktreeStatus::Clean,
        Ok(count) => WorktreeStatus::Changes { count },
        Err(e) => {
            debug!(path = %worktree.path.display(), error = %e, "status unavailable");
            WorktreeStatus::Missing
        }
    }
}

pub fn derive_sync(vcs: &dyn Vcs, worktree: &Worktree, status: WorktreeStatus) -> SyncState {
    if status == WorktreeStatus::Missing || worktree.branch.is_none() {
        return SyncState::NoUpstream;
    }
    SyncState::from_counts(vcs.upstream_sync(&worktree.path))
}

/// Registry snapshot with derived columns
pub fn load_rows(ctx: &RepoContext, vcs: &dyn Vcs) -> Result<Vec<DashboardRow>, TwigsError> {
    let worktrees = registry::read_worktrees(vcs)?;
    let current = registry::worktree_containing(&worktrees, &ctx.cwd).map(|w| w.path.clone());
    Ok(worktrees
        .into_iter()
        .map(|worktree| {
            let status = derive_status(vcs, &worktree);
            let sync = derive_sync(vcs, &worktree, status);
            DashboardRow {
                current: current.as_deref() == Some(worktree.path.as_path()),
                worktree,
                status,
                sync,
            }
        })
        .collect())
}

/// Aligned plain-text table
pub fn render_rows(rows: &[DashboardRow], root: &Path) -> String {
    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            [
                row.worktree.branch_label().to_string(),
                row.worktree.display_path(root),
                row.status.to_string(),
                row.sync.to_string(),
            ]
        })
        .collect();

    let mut widths = [0usize; 4];
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    rows.iter()
        .zip(cells.iter())
        .map(|(row, line)| {
            let marker = if row.current { '*' } else { ' ' };
            format!(
                "{} {:<w0$}  {:<w1$}  {:<w2$}  {}",
                marker,
                line[0],
                line[1],
                line[2],
                line[3],
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2],
            )
            .trim_end()
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether the loop keeps going after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(Navigation),
}

impl Flow {
    fn from_navigation(navigation: Navigation) -> Self {
        match navigation {
            Navigation::Stay => Flow::Continue,
            to => Flow::Exit(to),
        }
    }
}

pub struct Dashboard<'a> {
    manager: &'a Manager<'a>,
    launcher: &'a dyn Launcher,
}

impl<'a> Dashboard<'a> {
    pub fn new(manager: &'a Manager<'a>, launcher: &'a dyn Launcher) -> Self {
        Self { manager, launcher }
    }

    /// Render, pick, dispatch until an action relocates or the user quits
    pub fn run(&self) -> Result<Navigation, TwigsError> {
        let ui = self.manager.ui;
        let labels: Vec<String> = DashboardAction::ALL
            .iter()
            .map(|a| a.label().to_string())
            .collect();

        loop {
            let rows = load_rows(self.manager.ctx, self.manager.vcs)?;
            ui.print_header(&format!("twigs: {}", self.manager.ctx.repo_root.display()));
            ui.print_info(&render_rows(&rows, &self.manager.ctx.repo_root));

            let action = match ui.ask_select("Action", &labels) {
                Ok(index) => DashboardAction::ALL
                    .get(index)
                    .copied()
                    .unwrap_or(DashboardAction::Quit),
                Err(InteractionError::Cancelled) => return Ok(Navigation::Stay),
                Err(InteractionError::NonTty) => {
                    return Err(TwigsError::SelectorUnavailable {
                        reason: "the dashboard".to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            };
            debug!(?action, "dashboard action");

            match self.dispatch(action, &rows) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit(navigation)) => return Ok(navigation),
                Err(TwigsError::Interaction(InteractionError::Cancelled)) => {}
                Err(e) => ui.print_error(&format!("[{}] {}", e.code(), e)),
            }
        }
    }

    pub fn dispatch(
        &self,
        action: DashboardAction,
        rows: &[DashboardRow],
    ) -> Result<Flow, TwigsError> {
        let manager = self.manager;
        let ui = manager.ui;

        match action {
            DashboardAction::NewWorktree => {
                let branch = ui.ask_text("Branch name (empty for a generated one)", None)?;
                let branch = Some(branch.trim().to_string()).filter(|b| !b.is_empty());
                let outcome = manager.add(&AddRequest {
                    branch,
                    ..AddRequest::default()
                })?;
                Ok(Flow::Exit(outcome.navigation))
            }
            DashboardAction::CheckoutBranch => {
                let branches = manager.checkout_candidates()?;
                if branches.is_empty() {
                    ui.print_info("Every branch already has a worktree");
                    return Ok(Flow::Continue);
                }
                let index = ui.ask_select("Branch", &branches)?;
                let outcome = manager.add(&AddRequest {
                    branch: branches.get(index).cloned(),
                    ..AddRequest::default()
                })?;
                Ok(Flow::Exit(outcome.navigation))
            }
            DashboardAction::CheckoutPr => {
                let reference = ui.ask_text("Pull request number or URL", None)?;
                let outcome = manager.checkout_pr(&reference, false)?;
                Ok(Flow::Exit(outcome.navigation))
            }
            DashboardAction::Switch => {
                let row = self.pick_row(rows, "Switch to", true)?;
                Ok(Flow::Exit(Navigation::To(row.worktree.path.clone())))
            }
            DashboardAction::OpenEditor => {
                let row = self.pick_row(rows, "Open in editor", true)?;
                self.launcher.open_editor(&row.worktree.path)?;
                Ok(Flow::Continue)
            }
            DashboardAction::ShowDiff => {
                let row = self.pick_row(rows, "Show diff for", true)?;
                self.launcher.show_diff(&row.worktree.path)?;
                Ok(Flow::Continue)
            }
            DashboardAction::Move => {
                let row = self.pick_row(rows, "Move", true)?;
                let dest = ui.ask_text("Destination (empty for a generated one)", None)?;
                let dest = Some(dest.trim().to_string())
                    .filter(|d| !d.is_empty())
                    .map(Into::into);
                let outcome = manager.move_worktree(&MoveRequest {
                    query: Some(row.worktree.path.display().to_string()),
                    dest,
                    no_cd: false,
                })?;
                Ok(Flow::from_navigation(outcome.navigation))
            }
            DashboardAction::Remove => {
                let row = self.pick_row(rows, "Remove", false)?;
                let target = row.worktree.path.display().to_string();
                let outcome = manager.remove(Some(&target), false)?;
                Ok(Flow::from_navigation(outcome.navigation()))
            }
            DashboardAction::BatchClean => {
                let report = staleness::world(manager.ctx, manager.vcs, ui)?;
                Ok(Flow::from_navigation(report.navigation))
            }
            DashboardAction::Refresh => Ok(Flow::Continue),
            DashboardAction::Quit => Ok(Flow::Exit(Navigation::Stay)),
        }
    }

    fn pick_row<'r>(
        &self,
        rows: &'r [DashboardRow],
        prompt: &str,
        include_main: bool,
    ) -> Result<&'r DashboardRow, TwigsError> {
        let choices: Vec<&DashboardRow> = rows
            .iter()
            .filter(|row| include_main || !row.worktree.is_main)
            .collect();
        if choices.is_empty() {
            return Err(TwigsError::WorktreeNotFound {
                query: "*".to_string(),
            });
        }
        let root = &self.manager.ctx.repo_root;
        let labels: Vec<String> = choices
            .iter()
            .map(|row| {
                format!(
                    "{}  {}  {}",
                    row.worktree.branch_label(),
                    row.worktree.display_path(root),
                    row.status
                )
            })
            .collect();
        let index = self.manager.ui.ask_select(prompt, &labels)?;
        choices.get(index).copied().ok_or_else(|| {
            InteractionError::InvalidInput(format!("no option {}", index)).into()
        })
    }
}
