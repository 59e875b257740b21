//! Worktree lifecycle: add, remove, move (with main-branch extraction) and
//! pull request checkout
//!
//! Every operation reads the registry fresh, mutates it through the `Vcs`
//! port, and reports where the caller should end up as a `Navigation`.

use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::context::RepoContext;
use crate::error::TwigsError;
use crate::hosting::{Hosting, parse_pr_reference};
use crate::interaction::{InteractionAdapter, InteractionError};
use crate::naming;
use crate::registry;
use crate::resolver;
use crate::types::{Navigation, Outcome, Worktree};
use crate::vcs::{Vcs, WorktreeSource};

/// Arguments for `add`
#[derive(Debug, Clone, Default)]
pub struct AddRequest {
    /// Branch to check out or create; generated when absent
    pub branch: Option<String>,
    /// Destination, relative to the caller; conventional path when absent
    pub path: Option<PathBuf>,
    /// Base new branches on the caller's current branch instead of the default
    pub from_current: bool,
    pub no_cd: bool,
}

/// Arguments for `move_worktree`
#[derive(Debug, Clone, Default)]
pub struct MoveRequest {
    /// Worktree to move; the caller's worktree or a selection when absent
    pub query: Option<String>,
    /// Destination, relative to the caller; generated when absent
    pub dest: Option<PathBuf>,
    pub no_cd: bool,
}

/// Result of `remove`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed {
        path: PathBuf,
        branch: Option<String>,
        branch_deleted: bool,
        navigation: Navigation,
    },
    /// Confirmation was declined or impossible; nothing changed
    Skipped { path: PathBuf },
}

impl RemoveOutcome {
    pub fn navigation(&self) -> Navigation {
        match self {
            RemoveOutcome::Removed { navigation, .. } => navigation.clone(),
            RemoveOutcome::Skipped { .. } => Navigation::Stay,
        }
    }
}

/// Operation runner bound to one repository and a set of ports
pub struct Manager<'a> {
    pub ctx: &'a RepoContext,
    pub vcs: &'a dyn Vcs,
    pub hosting: &'a dyn Hosting,
    pub ui: &'a dyn InteractionAdapter,
    words: OnceCell<Vec<String>>,
}

impl<'a> Manager<'a> {
    pub fn new(
        ctx: &'a RepoContext,
        vcs: &'a dyn Vcs,
        hosting: &'a dyn Hosting,
        ui: &'a dyn InteractionAdapter,
    ) -> Self {
        Self {
            ctx,
            vcs,
            hosting,
            ui,
            words: OnceCell::new(),
        }
    }

    /// Fresh registry snapshot
    pub fn worktrees(&self) -> Result<Vec<Worktree>, TwigsError> {
        registry::read_worktrees(self.vcs)
    }

    /// Collision-free generated branch name and its conventional path
    pub fn generate_name(&self) -> (String, PathBuf) {
        let identity = naming::resolve_identity(self.ctx, self.vcs, self.hosting);
        let words = self
            .words
            .get_or_init(|| naming::load_words(&self.ctx.config.twigs.words_file));
        naming::generate_unique(self.ctx, self.vcs, &identity, words)
    }

    /// Worktree the caller is standing in
    fn caller_worktree<'w>(&self, worktrees: &'w [Worktree]) -> Option<&'w Worktree> {
        registry::worktree_containing(worktrees, &self.ctx.cwd)
    }

    fn caller_inside(&self, worktree: &Worktree) -> bool {
        worktree.contains(&self.ctx.cwd)
    }

    /// Add the conventional directory to the local ignore file
    fn register_worktree_dir(&self) -> Result<(), TwigsError> {
        let root = self.ctx.worktree_root();
        let Ok(relative) = root.strip_prefix(&self.ctx.repo_root) else {
            return Ok(());
        };
        if relative.as_os_str().is_empty() {
            return Ok(());
        }
        naming::ensure_ignored(&self.ctx.common_dir, &relative.to_string_lossy()).map(|_| ())
    }

    /// Create a worktree, making sure nothing stays registered on failure
    fn create_worktree(&self, path: &Path, source: &WorktreeSource) -> Result<(), TwigsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let Err(err) = self.vcs.worktree_add(path, source) else {
            info!(path = %path.display(), ?source, "created worktree");
            return Ok(());
        };

        let registered = registry::read_worktrees(self.vcs)
            .map(|all| all.iter().any(|w| w.path == path))
            .unwrap_or(false);
        if registered {
            warn!(path = %path.display(), "removing partially created worktree");
            if let Err(cleanup) = self.vcs.worktree_remove(path, true) {
                warn!(error = %cleanup, "could not remove partial worktree");
            }
        }
        Err(TwigsError::WorktreeCreationFailed {
            reason: err.to_string(),
        })
    }

    /// Local ref, then remote-tracking ref, then a new branch from `base`
    pub fn branch_source(&self, branch: &str, base: &str) -> Result<WorktreeSource, TwigsError> {
        if self.vcs.ref_exists(&format!("refs/heads/{}", branch)) {
            return Ok(WorktreeSource::Existing {
                branch: branch.to_string(),
            });
        }

        let remotes = self.vcs.remote_branches()?;
        let preferred = format!("{}/{}", self.ctx.config.twigs.remote, branch);
        let tracked = if remotes.contains(&preferred) {
            Some(preferred)
        } else {
            remotes
                .into_iter()
                .find(|r| r.split_once('/').is_some_and(|(_, name)| name == branch))
        };

        Ok(match tracked {
            Some(remote_ref) => WorktreeSource::Track {
                branch: branch.to_string(),
                remote_ref,
            },
            None => WorktreeSource::New {
                branch: branch.to_string(),
                base: base.to_string(),
            },
        })
    }

    fn current_branch_base(&self, worktrees: &[Worktree]) -> Result<String, TwigsError> {
        let here = match self.caller_worktree(worktrees) {
            Some(wt) => wt,
            None => registry::main_worktree(worktrees)?,
        };
        here.branch
            .clone()
            .ok_or_else(|| TwigsError::DetachedHead {
                path: here.path.clone(),
            })
    }

    /// Create a worktree for a new or existing branch
    pub fn add(&self, request: &AddRequest) -> Result<Outcome, TwigsError> {
        let worktrees = self.worktrees()?;

        let (branch, generated_path) = match &request.branch {
            Some(branch) => (branch.clone(), None),
            None => {
                let (branch, path) = self.generate_name();
                (branch, Some(path))
            }
        };

        if let Some(existing) = registry::worktree_for_branch(&worktrees, &branch) {
            return Err(TwigsError::BranchCheckedOut {
                branch,
                path: existing.path.clone(),
            });
        }

        let (path, conventional) = match &request.path {
            Some(path) => (self.ctx.absolutize(path), false),
            None => (
                generated_path.unwrap_or_else(|| naming::default_path(self.ctx, &branch)),
                true,
            ),
        };
        if path.exists() || worktrees.iter().any(|w| w.path == path) {
            return Err(TwigsError::DestinationExists { path });
        }

        let base = if request.from_current {
            self.current_branch_base(&worktrees)?
        } else {
            self.ctx.default_branch.clone()
        };
        let source = self.branch_source(&branch, &base)?;

        if conventional {
            self.register_worktree_dir()?;
        }
        self.create_worktree(&path, &source)?;

        let navigation = if request.no_cd {
            Navigation::Stay
        } else {
            Navigation::To(path.clone())
        };
        Ok(Outcome {
            path,
            branch: Some(branch),
            navigation,
        })
    }

    /// Branches that could get a worktree: local ones without a worktree,
    /// then remote-only ones
    pub fn checkout_candidates(&self) -> Result<Vec<String>, TwigsError> {
        let worktrees = self.worktrees()?;
        let checked_out: BTreeSet<&str> =
            worktrees.iter().filter_map(|w| w.branch.as_deref()).collect();

        let local = self.vcs.local_branches()?;
        let mut seen: BTreeSet<String> = local.iter().cloned().collect();
        let mut candidates: Vec<String> = local
            .into_iter()
            .filter(|b| !checked_out.contains(b.as_str()))
            .collect();

        for remote in self.vcs.remote_branches()? {
            let Some((_, name)) = remote.split_once('/') else {
                continue;
            };
            if seen.insert(name.to_string()) {
                candidates.push(name.to_string());
            }
        }
        Ok(candidates)
    }

    /// Target for `remove`: refuses main, prefers the caller's worktree
    fn removal_target(
        &self,
        worktrees: &[Worktree],
        query: Option<&str>,
    ) -> Result<Worktree, TwigsError> {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => {
                let found = resolver::resolve(self.ctx, self.ui, worktrees, Some(query))?;
                if found.is_main {
                    return Err(TwigsError::CannotRemoveMain);
                }
                Ok(found)
            }
            None => match self.caller_worktree(worktrees) {
                Some(here) if !here.is_main => Ok(here.clone()),
                _ => {
                    let linked: Vec<Worktree> =
                        worktrees.iter().filter(|w| !w.is_main).cloned().collect();
                    resolver::resolve(self.ctx, self.ui, &linked, None)
                }
            },
        }
    }

    /// Whether removing a worktree may also delete its branch
    fn branch_deletable(&self, branch: &str, main: &Worktree) -> bool {
        !self.ctx.is_protected(branch) && main.branch.as_deref() != Some(branch)
    }

    /// Remove a linked worktree and, when allowed, its branch
    pub fn remove(&self, target: Option<&str>, force: bool) -> Result<RemoveOutcome, TwigsError> {
        let worktrees = self.worktrees()?;
        let main = registry::main_worktree(&worktrees)?.clone();
        let worktree = self.removal_target(&worktrees, target)?;

        if !force {
            let prompt = format!(
                "Remove worktree {} ({})?",
                worktree.display_path(&self.ctx.repo_root),
                worktree.branch_label()
            );
            let confirmed = match self.ui.ask_confirm(&prompt, false) {
                Ok(answer) => answer,
                Err(InteractionError::NonTty) => {
                    self.ui.print_warning(
                        "no terminal to confirm removal; pass --force to skip the prompt",
                    );
                    false
                }
                Err(InteractionError::Cancelled | InteractionError::Timeout) => false,
                Err(e) => return Err(e.into()),
            };
            if !confirmed {
                self.ui.print_info(&format!(
                    "Skipped {}",
                    worktree.display_path(&self.ctx.repo_root)
                ));
                return Ok(RemoveOutcome::Skipped {
                    path: worktree.path,
                });
            }
        }

        self.vcs
            .worktree_remove(&worktree.path, force)
            .map_err(|e| TwigsError::WorktreeCleanupFailed {
                reason: e.to_string(),
            })?;
        info!(path = %worktree.path.display(), "removed worktree");
        self.ui.print_success(&format!(
            "Removed worktree {}",
            worktree.display_path(&self.ctx.repo_root)
        ));

        let branch_deleted = match worktree.branch.as_deref() {
            Some(branch) if self.branch_deletable(branch, &main) => {
                self.delete_branch(branch, force)
            }
            _ => false,
        };

        let navigation = if self.caller_inside(&worktree) {
            Navigation::To(main.path.clone())
        } else {
            Navigation::Stay
        };
        Ok(RemoveOutcome::Removed {
            path: worktree.path,
            branch: worktree.branch,
            branch_deleted,
            navigation,
        })
    }

    /// Ancestry-checked unless forced; a refused delete keeps the branch
    fn delete_branch(&self, branch: &str, force: bool) -> bool {
        match self.vcs.branch_delete(branch, force) {
            Ok(()) => {
                info!(branch, force, "deleted branch");
                self.ui.print_success(&format!("Deleted branch {}", branch));
                true
            }
            Err(e) => {
                warn!(branch, error = %e, "branch delete refused");
                self.ui.print_warning(&format!(
                    "kept branch '{}' (not fully merged; use --force to delete it): {}",
                    branch, e
                ));
                false
            }
        }
    }

    /// Relocate a worktree, or extract main's branch into a linked worktree
    pub fn move_worktree(&self, request: &MoveRequest) -> Result<Outcome, TwigsError> {
        let worktrees = self.worktrees()?;
        let target = match request.query.as_deref() {
            Some(query) => resolver::resolve(self.ctx, self.ui, &worktrees, Some(query))?,
            None => match self.caller_worktree(&worktrees) {
                Some(here) => here.clone(),
                None => resolver::resolve(self.ctx, self.ui, &worktrees, None)?,
            },
        };

        if target.is_main {
            return self.extract(&target, request);
        }

        let (dest, generated_branch) = match &request.dest {
            Some(dest) => (self.ctx.absolutize(dest), None),
            None => {
                let (branch, path) = self.generate_name();
                (path, Some(branch))
            }
        };
        if dest.exists() {
            return Err(TwigsError::DestinationExists { path: dest });
        }
        if generated_branch.is_some() {
            self.register_worktree_dir()?;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        self.vcs.worktree_move(&target.path, &dest)?;
        info!(from = %target.path.display(), to = %dest.display(), "moved worktree");

        let mut branch = target.branch.clone();
        if let (Some(generated), Some(current)) = (generated_branch, target.branch.as_deref()) {
            if self.offer_rename(current, &generated)? {
                branch = Some(generated);
            }
        }

        let navigation = if !request.no_cd && self.caller_inside(&target) {
            Navigation::To(dest.clone())
        } else {
            Navigation::Stay
        };
        Ok(Outcome {
            path: dest,
            branch,
            navigation,
        })
    }

    /// Offer to rename a moved worktree's branch to its generated name
    fn offer_rename(&self, current: &str, generated: &str) -> Result<bool, TwigsError> {
        if !self.ui.is_interactive() || self.ctx.is_protected(current) {
            return Ok(false);
        }
        let prompt = format!("Rename branch '{}' to '{}'?", current, generated);
        match self.ui.ask_confirm(&prompt, false) {
            Ok(true) => {
                self.vcs.branch_rename(current, generated)?;
                info!(from = current, to = generated, "renamed branch");
                Ok(true)
            }
            Ok(false) | Err(InteractionError::Cancelled | InteractionError::NonTty) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Move main's branch into a linked worktree and put main back on the
    /// default branch
    fn extract(&self, main: &Worktree, request: &MoveRequest) -> Result<Outcome, TwigsError> {
        let default_branch = &self.ctx.default_branch;
        let branch = match main.branch.as_deref() {
            Some(branch) if branch != default_branch => branch.to_string(),
            other => {
                return Err(TwigsError::NothingToExtract {
                    branch: other.unwrap_or("(detached)").to_string(),
                });
            }
        };

        let (path, conventional) = match &request.dest {
            Some(dest) => (self.ctx.absolutize(dest), false),
            None => (naming::default_path(self.ctx, &branch), true),
        };
        if path.exists() {
            return Err(TwigsError::DestinationExists { path });
        }

        self.vcs.switch(&main.path, default_branch)?;
        info!(branch = %branch, "switched main worktree to {}", default_branch);

        let source = WorktreeSource::Existing {
            branch: branch.clone(),
        };
        let registered = if conventional {
            self.register_worktree_dir()
        } else {
            Ok(())
        };
        let created = registered.and_then(|_| self.create_worktree(&path, &source));

        if let Err(err) = created {
            warn!(branch = %branch, "extraction failed, switching main back");
            if let Err(rollback) = self.vcs.switch(&main.path, &branch) {
                warn!(error = %rollback, "could not restore main worktree branch");
            }
            return Err(err);
        }

        let worktrees = self.worktrees()?;
        let caller_in_main = self
            .caller_worktree(&worktrees)
            .is_some_and(|here| here.is_main);
        let navigation = if !request.no_cd && caller_in_main {
            Navigation::To(path.clone())
        } else {
            Navigation::Stay
        };
        Ok(Outcome {
            path,
            branch: Some(branch),
            navigation,
        })
    }

    /// Check out a pull request into its conventional worktree
    ///
    /// Reuses an existing worktree at that path, so repeating the call is
    /// harmless.
    pub fn checkout_pr(&self, reference: &str, no_cd: bool) -> Result<Outcome, TwigsError> {
        let number = parse_pr_reference(reference)?;
        if !self.hosting.is_available() {
            return Err(TwigsError::HostingCliMissing);
        }

        let branch = self.hosting.pr_head_branch(number)?;
        let path = naming::default_path(self.ctx, &branch);
        let navigation = if no_cd {
            Navigation::Stay
        } else {
            Navigation::To(path.clone())
        };

        let worktrees = self.worktrees()?;
        if let Some(existing) = worktrees.iter().find(|w| w.path == path) {
            info!(number, path = %path.display(), "reusing existing pull request worktree");
            return Ok(Outcome {
                path,
                branch: existing.branch.clone().or(Some(branch)),
                navigation,
            });
        }
        if let Some(other) = registry::worktree_for_branch(&worktrees, &branch) {
            return Err(TwigsError::BranchCheckedOut {
                branch,
                path: other.path.clone(),
            });
        }

        self.register_worktree_dir()?;
        self.create_worktree(
            &path,
            &WorktreeSource::Detached {
                commitish: self.ctx.default_branch.clone(),
            },
        )?;

        if let Err(reason) = self.fetch_pr_into(&path, number, &branch) {
            warn!(number, "pull request checkout failed, removing partial worktree");
            if let Err(cleanup) = self.vcs.worktree_remove(&path, true) {
                warn!(error = %cleanup, "could not remove partial worktree");
            }
            return Err(TwigsError::PrCheckoutFailed { number, reason });
        }

        Ok(Outcome {
            path,
            branch: Some(branch),
            navigation,
        })
    }

    /// `gh pr checkout`, falling back to fetching the pull ref directly
    fn fetch_pr_into(&self, path: &Path, number: u64, branch: &str) -> Result<(), String> {
        let Err(primary) = self.hosting.checkout_pr(path, number, branch) else {
            return Ok(());
        };
        warn!(number, error = %primary, "checkout by number failed, fetching pull ref");

        let remote = &self.ctx.config.twigs.remote;
        self.vcs
            .fetch_pull_ref(path, remote, number, branch)
            .and_then(|_| self.vcs.switch(path, branch))
            .map_err(|fallback| format!("{}; fallback fetch failed: {}", primary, fallback))
    }

    /// Worktree for `goto`/`cd`; `-` is the main worktree
    pub fn locate(&self, query: Option<&str>) -> Result<Worktree, TwigsError> {
        let worktrees = self.worktrees()?;
        if query.map(str::trim) == Some("-") {
            return registry::main_worktree(&worktrees).cloned();
        }
        resolver::resolve(self.ctx, self.ui, &worktrees, query)
    }
}
