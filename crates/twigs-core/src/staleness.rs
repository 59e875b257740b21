//! Staleness analysis and batch cleanup (`twigs world`)
//!
//! Classifies linked worktrees and local branches as safe to remove, shows
//! them, and removes them only after a bounded confirmation.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::context::RepoContext;
use crate::error::TwigsError;
use crate::interaction::{InteractionAdapter, InteractionError};
use crate::registry;
use crate::types::{CandidateTarget, Navigation, RemovalCandidate, RemovalReason};
use crate::vcs::Vcs;

/// What a cleanup run found and did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub candidates: Vec<RemovalCandidate>,
    pub removed_worktrees: Vec<PathBuf>,
    pub deleted_branches: Vec<String>,
    /// Per-item failures; the run continues past them
    pub failures: Vec<String>,
    /// Destructive work was skipped (declined, timed out, or no terminal)
    pub skipped: bool,
    pub navigation: Navigation,
}

impl CleanupReport {
    fn new(candidates: Vec<RemovalCandidate>) -> Self {
        Self {
            candidates,
            removed_worktrees: Vec::new(),
            deleted_branches: Vec::new(),
            failures: Vec::new(),
            skipped: false,
            navigation: Navigation::Stay,
        }
    }
}

/// Names that exist on some remote, without the remote prefix
fn remote_names(vcs: &dyn Vcs) -> Result<BTreeSet<String>, TwigsError> {
    Ok(vcs
        .remote_branches()?
        .into_iter()
        .filter_map(|r| r.split_once('/').map(|(_, name)| name.to_string()))
        .collect())
}

/// Upstream configured but no longer resolvable
fn upstream_gone(vcs: &dyn Vcs, branch: &str) -> Option<bool> {
    vcs.upstream_ref(branch).map(|upstream| !vcs.ref_exists(&upstream))
}

/// Reason a branch without a worktree can go, first match wins
fn classify_branch(
    ctx: &RepoContext,
    vcs: &dyn Vcs,
    branch: &str,
    remotes: &BTreeSet<String>,
) -> Option<RemovalReason> {
    let has_upstream = match upstream_gone(vcs, branch) {
        Some(true) => return Some(RemovalReason::UpstreamGone),
        Some(false) => true,
        None => false,
    };

    let (ahead, behind) = match vcs.ahead_behind(branch, &ctx.default_branch) {
        Ok(counts) => counts,
        Err(e) => {
            debug!(branch, error = %e, "cannot compare with default branch");
            return None;
        }
    };

    if ctx.config.cleanup.include_no_remote
        && !has_upstream
        && !remotes.contains(branch)
        && ahead == 0
    {
        return Some(RemovalReason::NoRemote);
    }

    if ahead == 0 && behind >= 1 && vcs.is_ancestor(branch, &ctx.default_branch) {
        return Some(RemovalReason::Merged);
    }

    None
}

/// Everything safe to remove, worktrees first
///
/// Never yields the main worktree, a protected branch, or (in the branch
/// scan) a branch that backs a worktree.
pub fn analyze(ctx: &RepoContext, vcs: &dyn Vcs) -> Result<Vec<RemovalCandidate>, TwigsError> {
    let worktrees = registry::read_worktrees(vcs)?;
    let remotes = remote_names(vcs)?;
    let mut candidates = Vec::new();

    for worktree in worktrees.iter().filter(|w| !w.is_main) {
        let Some(branch) = worktree.branch.as_deref() else {
            continue;
        };
        if ctx.is_protected(branch) {
            continue;
        }
        let reason = match upstream_gone(vcs, branch) {
            Some(true) => Some(RemovalReason::UpstreamGone),
            Some(false) => None,
            None if ctx.config.cleanup.include_no_remote && !remotes.contains(branch) => {
                Some(RemovalReason::NoRemote)
            }
            None => None,
        };
        if let Some(reason) = reason {
            candidates.push(RemovalCandidate {
                target: CandidateTarget::Worktree(worktree.clone()),
                reason,
            });
        }
    }

    let checked_out: BTreeSet<&str> =
        worktrees.iter().filter_map(|w| w.branch.as_deref()).collect();
    for branch in vcs.local_branches()? {
        if ctx.is_protected(&branch) || checked_out.contains(branch.as_str()) {
            continue;
        }
        if let Some(reason) = classify_branch(ctx, vcs, &branch, &remotes) {
            candidates.push(RemovalCandidate {
                target: CandidateTarget::Branch { name: branch },
                reason,
            });
        }
    }

    debug!(count = candidates.len(), "staleness analysis complete");
    Ok(candidates)
}

/// One listing line for a candidate
pub fn describe(ctx: &RepoContext, candidate: &RemovalCandidate) -> String {
    let flag = if candidate.reason == RemovalReason::NoRemote {
        " (local only)"
    } else {
        ""
    };
    match &candidate.target {
        CandidateTarget::Worktree(worktree) => format!(
            "worktree {} [{}]: {}{}",
            worktree.display_path(&ctx.repo_root),
            worktree.branch_label(),
            candidate.reason,
            flag
        ),
        CandidateTarget::Branch { name } => {
            format!("branch {}: {}{}", name, candidate.reason, flag)
        }
    }
}

/// Refresh remotes, analyze, confirm, and remove
pub fn world(
    ctx: &RepoContext,
    vcs: &dyn Vcs,
    ui: &dyn InteractionAdapter,
) -> Result<CleanupReport, TwigsError> {
    let progress = ui.start_progress("Fetching remotes");
    let fetched = vcs.fetch_all();
    ui.end_progress(progress, fetched.is_ok());
    if let Err(e) = fetched {
        warn!(error = %e, "remote refresh failed");
        ui.print_warning(&format!("could not refresh remotes, using cached state: {}", e));
    }

    let candidates = analyze(ctx, vcs)?;
    let mut report = CleanupReport::new(candidates);
    if report.candidates.is_empty() {
        ui.print_success("Nothing to clean up");
        return Ok(report);
    }

    ui.print_header("Removal candidates");
    for candidate in &report.candidates {
        ui.print_info(&format!("  {}", describe(ctx, candidate)));
    }

    let timeout = Duration::from_secs(ctx.config.twigs.confirm_timeout_secs);
    let prompt = format!(
        "Remove {} item(s)? (waiting {}s)",
        report.candidates.len(),
        timeout.as_secs()
    );
    let confirmed = match ui.ask_confirm_timeout(&prompt, timeout) {
        Ok(answer) => answer,
        Err(InteractionError::Timeout) => {
            ui.print_warning("no answer in time; skipped cleanup");
            false
        }
        Err(InteractionError::NonTty) => {
            ui.print_warning("no terminal to confirm; skipped cleanup");
            false
        }
        Err(InteractionError::Cancelled) => false,
        Err(e) => return Err(e.into()),
    };
    if !confirmed {
        ui.print_info("Nothing was removed");
        report.skipped = true;
        return Ok(report);
    }

    execute(ctx, vcs, ui, &mut report);
    Ok(report)
}

fn execute(
    ctx: &RepoContext,
    vcs: &dyn Vcs,
    ui: &dyn InteractionAdapter,
    report: &mut CleanupReport,
) {
    let candidates = report.candidates.clone();

    for candidate in &candidates {
        let CandidateTarget::Worktree(worktree) = &candidate.target else {
            continue;
        };
        let removed = vcs.worktree_remove(&worktree.path, false).or_else(|e| {
            debug!(path = %worktree.path.display(), error = %e, "plain removal refused, forcing");
            vcs.worktree_remove(&worktree.path, true)
        });
        if let Err(e) = removed {
            let message = format!("could not remove {}: {}", worktree.path.display(), e);
            ui.print_error(&message);
            report.failures.push(message);
            continue;
        }
        info!(path = %worktree.path.display(), reason = %candidate.reason, "removed worktree");
        ui.print_success(&format!(
            "Removed worktree {}",
            worktree.display_path(&ctx.repo_root)
        ));
        report.removed_worktrees.push(worktree.path.clone());
        if worktree.contains(&ctx.cwd) {
            report.navigation = Navigation::To(ctx.repo_root.clone());
        }

        if let Some(branch) = worktree.branch.as_deref() {
            delete_branch(vcs, ui, report, branch, candidate.reason.needs_forced_delete());
        }
    }

    for candidate in &candidates {
        if let CandidateTarget::Branch { name } = &candidate.target {
            delete_branch(vcs, ui, report, name, candidate.reason.needs_forced_delete());
        }
    }
}

fn delete_branch(
    vcs: &dyn Vcs,
    ui: &dyn InteractionAdapter,
    report: &mut CleanupReport,
    branch: &str,
    force: bool,
) {
    match vcs.branch_delete(branch, force) {
        Ok(()) => {
            info!(branch, force, "deleted branch");
            ui.print_success(&format!("Deleted branch {}", branch));
            report.deleted_branches.push(branch.to_string());
        }
        Err(e) => {
            let message = format!("could not delete branch {}: {}", branch, e);
            ui.print_warning(&message);
            report.failures.push(message);
        }
    }
}
