//! Deterministic doubles for the ports, shared by the unit tests

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use crate::config::Config;
use crate::context::RepoContext;
use crate::dashboard::Launcher;
use crate::error::TwigsError;
use crate::hosting::Hosting;
use crate::interaction::{InteractionAdapter, InteractionError, InteractionResult, ProgressHandle};
use crate::lifecycle::Manager;
use crate::types::{InProgressOp, Worktree};
use crate::vcs::{Vcs, WorktreeSource};

/// Local branch state known to `FakeVcs`
#[derive(Debug, Clone, Default)]
pub struct FakeBranch {
    /// Fully-qualified upstream ref, e.g. `refs/remotes/origin/foo`
    pub upstream: Option<String>,
    /// Commits ahead of the default branch
    pub ahead: usize,
    /// Commits behind the default branch
    pub behind: usize,
    /// Whether the branch is an ancestor of the default branch
    pub merged: bool,
}

#[derive(Default)]
struct FakeState {
    worktrees: Vec<Worktree>,
    branches: BTreeMap<String, FakeBranch>,
    remote_branches: BTreeSet<String>,
    symbolic_refs: HashMap<String, String>,
    config: HashMap<String, String>,
    changes: HashMap<PathBuf, usize>,
    in_progress: HashMap<PathBuf, InProgressOp>,
    sync: HashMap<PathBuf, (usize, usize)>,
    failures: HashSet<String>,
    calls: Vec<String>,
}

/// In-memory repository
///
/// Mutations update the registry the way git would and are recorded in a
/// call log. `fail_on("op")` or `fail_on("op:arg")` makes a call fail.
pub struct FakeVcs {
    root: PathBuf,
    state: RefCell<FakeState>,
}

impl FakeVcs {
    /// Repository whose main worktree sits at `root` on branch `main`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut state = FakeState::default();
        state.worktrees.push(Worktree {
            path: root.clone(),
            branch: Some("main".to_string()),
            head: Some(fake_sha(0)),
            is_main: true,
            is_bare: false,
            prunable: false,
        });
        state.branches.insert("main".to_string(), FakeBranch::default());
        Self {
            root,
            state: RefCell::new(state),
        }
    }

    pub fn add_branch(&self, name: &str) {
        self.add_branch_with(name, FakeBranch::default());
    }

    pub fn add_branch_with(&self, name: &str, branch: FakeBranch) {
        self.state
            .borrow_mut()
            .branches
            .insert(name.to_string(), branch);
    }

    pub fn forget_branch(&self, name: &str) {
        self.state.borrow_mut().branches.remove(name);
    }

    /// Remote-tracking branch by short name, e.g. `origin/foo`
    pub fn add_remote_branch(&self, name: &str) {
        self.state
            .borrow_mut()
            .remote_branches
            .insert(name.to_string());
    }

    /// Register a linked worktree, creating its branch when missing
    pub fn add_worktree(&self, path: impl Into<PathBuf>, branch: Option<&str>) {
        let mut state = self.state.borrow_mut();
        if let Some(name) = branch {
            state.branches.entry(name.to_string()).or_default();
        }
        let index = state.worktrees.len();
        state.worktrees.push(Worktree {
            path: path.into(),
            branch: branch.map(str::to_string),
            head: Some(fake_sha(index)),
            is_main: false,
            is_bare: false,
            prunable: false,
        });
    }

    /// Point the main worktree at another branch (or detach it)
    pub fn set_main_branch(&self, branch: Option<&str>) {
        let mut state = self.state.borrow_mut();
        if let Some(name) = branch {
            state.branches.entry(name.to_string()).or_default();
        }
        if let Some(main) = state.worktrees.iter_mut().find(|w| w.is_main) {
            main.branch = branch.map(str::to_string);
        }
    }

    pub fn set_symbolic_ref(&self, name: &str, target: &str) {
        self.state
            .borrow_mut()
            .symbolic_refs
            .insert(name.to_string(), target.to_string());
    }

    pub fn set_config(&self, key: &str, value: &str) {
        self.state
            .borrow_mut()
            .config
            .insert(key.to_string(), value.to_string());
    }

    pub fn set_changes(&self, path: &Path, count: usize) {
        self.state
            .borrow_mut()
            .changes
            .insert(path.to_path_buf(), count);
    }

    pub fn set_in_progress(&self, path: &Path, op: InProgressOp) {
        self.state
            .borrow_mut()
            .in_progress
            .insert(path.to_path_buf(), op);
    }

    pub fn set_sync(&self, path: &Path, ahead: usize, behind: usize) {
        self.state
            .borrow_mut()
            .sync
            .insert(path.to_path_buf(), (ahead, behind));
    }

    pub fn fail_on(&self, key: &str) {
        self.state.borrow_mut().failures.insert(key.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    /// Whether any recorded call starts with `prefix`
    pub fn called(&self, prefix: &str) -> bool {
        self.state
            .borrow()
            .calls
            .iter()
            .any(|call| call.starts_with(prefix))
    }

    pub fn worktrees(&self) -> Vec<Worktree> {
        self.state.borrow().worktrees.clone()
    }

    pub fn has_branch(&self, name: &str) -> bool {
        self.state.borrow().branches.contains_key(name)
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }

    fn check(&self, op: &str, arg: &str) -> Result<(), TwigsError> {
        let state = self.state.borrow();
        if state.failures.contains(op) || state.failures.contains(&format!("{}:{}", op, arg)) {
            return Err(TwigsError::GitCommand {
                args: format!("{} {}", op, arg),
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn porcelain(&self) -> String {
        let state = self.state.borrow();
        let mut out = String::new();
        for wt in &state.worktrees {
            out.push_str(&format!("worktree {}\n", wt.path.display()));
            if let Some(head) = &wt.head {
                out.push_str(&format!("HEAD {}\n", head));
            }
            match &wt.branch {
                Some(branch) => out.push_str(&format!("branch refs/heads/{}\n", branch)),
                None => out.push_str("detached\n"),
            }
            if wt.prunable {
                out.push_str("prunable gitdir file points to non-existent location\n");
            }
            out.push('\n');
        }
        out
    }
}

fn fake_sha(index: usize) -> String {
    format!("{:040x}", index + 1)
}

fn git_error(args: String, stderr: &str) -> TwigsError {
    TwigsError::GitCommand {
        args,
        stderr: stderr.to_string(),
    }
}

impl Vcs for FakeVcs {
    fn worktree_list(&self) -> Result<String, TwigsError> {
        self.check("worktree_list", "")?;
        Ok(self.porcelain())
    }

    fn worktree_list_human(&self) -> Result<String, TwigsError> {
        let state = self.state.borrow();
        Ok(state
            .worktrees
            .iter()
            .map(|wt| format!("{}  [{}]", wt.path.display(), wt.branch_label()))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn common_dir(&self) -> Result<PathBuf, TwigsError> {
        Ok(self.root.join(".git"))
    }

    fn symbolic_ref(&self, name: &str) -> Option<String> {
        self.state.borrow().symbolic_refs.get(name).cloned()
    }

    fn config_value(&self, key: &str) -> Option<String> {
        self.state.borrow().config.get(key).cloned()
    }

    fn ref_exists(&self, refname: &str) -> bool {
        let state = self.state.borrow();
        if let Some(branch) = refname.strip_prefix("refs/heads/") {
            return state.branches.contains_key(branch);
        }
        if let Some(remote) = refname.strip_prefix("refs/remotes/") {
            return state.remote_branches.contains(remote);
        }
        state.symbolic_refs.contains_key(refname)
    }

    fn local_branches(&self) -> Result<Vec<String>, TwigsError> {
        Ok(self.state.borrow().branches.keys().cloned().collect())
    }

    fn remote_branches(&self) -> Result<Vec<String>, TwigsError> {
        Ok(self.state.borrow().remote_branches.iter().cloned().collect())
    }

    fn upstream_ref(&self, branch: &str) -> Option<String> {
        self.state
            .borrow()
            .branches
            .get(branch)
            .and_then(|b| b.upstream.clone())
    }

    fn ahead_behind(&self, branch: &str, base: &str) -> Result<(usize, usize), TwigsError> {
        self.state
            .borrow()
            .branches
            .get(branch)
            .map(|b| (b.ahead, b.behind))
            .ok_or_else(|| {
                git_error(
                    format!("rev-list --left-right --count {}...{}", branch, base),
                    "unknown revision",
                )
            })
    }

    fn is_ancestor(&self, ancestor: &str, _descendant: &str) -> bool {
        self.state
            .borrow()
            .branches
            .get(ancestor)
            .is_some_and(|b| b.merged)
    }

    fn worktree_add(&self, path: &Path, source: &WorktreeSource) -> Result<(), TwigsError> {
        let description = match source {
            WorktreeSource::Existing { branch } => format!("existing {}", branch),
            WorktreeSource::Track { branch, remote_ref } => {
                format!("track {} {}", branch, remote_ref)
            }
            WorktreeSource::New { branch, base } => format!("new {} {}", branch, base),
            WorktreeSource::Detached { commitish } => format!("detach {}", commitish),
        };
        self.record(format!("worktree_add {} {}", path.display(), description));
        self.check("worktree_add", &path.display().to_string())?;

        let mut state = self.state.borrow_mut();
        if state.worktrees.iter().any(|w| w.path == path) {
            return Err(git_error(
                format!("worktree add {}", path.display()),
                "already exists",
            ));
        }
        if let Some(branch) = source.branch() {
            if state
                .worktrees
                .iter()
                .any(|w| w.branch.as_deref() == Some(branch))
            {
                return Err(git_error(
                    format!("worktree add {}", path.display()),
                    "branch is already checked out",
                ));
            }
        }
        match source {
            WorktreeSource::Existing { branch } => {
                if !state.branches.contains_key(branch) {
                    return Err(git_error(
                        format!("worktree add {}", path.display()),
                        "invalid reference",
                    ));
                }
            }
            WorktreeSource::Track { branch, remote_ref } => {
                state.branches.insert(
                    branch.clone(),
                    FakeBranch {
                        upstream: Some(format!("refs/remotes/{}", remote_ref)),
                        ..FakeBranch::default()
                    },
                );
            }
            WorktreeSource::New { branch, .. } => {
                if state.branches.contains_key(branch) {
                    return Err(git_error(
                        format!("worktree add {}", path.display()),
                        "branch already exists",
                    ));
                }
                state.branches.insert(branch.clone(), FakeBranch::default());
            }
            WorktreeSource::Detached { .. } => {}
        }
        let index = state.worktrees.len();
        state.worktrees.push(Worktree {
            path: path.to_path_buf(),
            branch: source.branch().map(str::to_string),
            head: Some(fake_sha(index)),
            is_main: false,
            is_bare: false,
            prunable: false,
        });
        Ok(())
    }

    fn worktree_remove(&self, path: &Path, force: bool) -> Result<(), TwigsError> {
        let suffix = if force { " --force" } else { "" };
        self.record(format!("worktree_remove {}{}", path.display(), suffix));
        let key = path.display().to_string();
        self.check("worktree_remove", &key)?;
        if !force {
            self.check("worktree_remove_plain", &key)?;
        }

        let mut state = self.state.borrow_mut();
        let before = state.worktrees.len();
        state.worktrees.retain(|w| w.is_main || w.path != path);
        if state.worktrees.len() == before {
            return Err(git_error(
                format!("worktree remove {}", key),
                "is not a working tree",
            ));
        }
        Ok(())
    }

    fn worktree_move(&self, from: &Path, to: &Path) -> Result<(), TwigsError> {
        self.record(format!("worktree_move {} {}", from.display(), to.display()));
        self.check("worktree_move", &from.display().to_string())?;

        let mut state = self.state.borrow_mut();
        match state.worktrees.iter_mut().find(|w| w.path == from) {
            Some(wt) => {
                wt.path = to.to_path_buf();
                Ok(())
            }
            None => Err(git_error(
                format!("worktree move {}", from.display()),
                "is not a working tree",
            )),
        }
    }

    fn worktree_prune(&self) -> Result<(), TwigsError> {
        self.record("worktree_prune".to_string());
        self.check("worktree_prune", "")?;
        self.state.borrow_mut().worktrees.retain(|w| !w.prunable);
        Ok(())
    }

    fn branch_delete(&self, branch: &str, force: bool) -> Result<(), TwigsError> {
        let flag = if force { "-D" } else { "-d" };
        self.record(format!("branch_delete {} {}", branch, flag));
        self.check("branch_delete", branch)?;
        if !force {
            self.check("branch_delete_safe", branch)?;
        }

        let mut state = self.state.borrow_mut();
        if state
            .worktrees
            .iter()
            .any(|w| w.branch.as_deref() == Some(branch))
        {
            return Err(git_error(
                format!("branch {} {}", flag, branch),
                "cannot delete branch checked out in a worktree",
            ));
        }
        state.branches.remove(branch).map(|_| ()).ok_or_else(|| {
            git_error(format!("branch {} {}", flag, branch), "branch not found")
        })
    }

    fn branch_rename(&self, old: &str, new: &str) -> Result<(), TwigsError> {
        self.record(format!("branch_rename {} {}", old, new));
        self.check("branch_rename", old)?;

        let mut state = self.state.borrow_mut();
        let Some(entry) = state.branches.remove(old) else {
            return Err(git_error(format!("branch -m {} {}", old, new), "branch not found"));
        };
        state.branches.insert(new.to_string(), entry);
        for wt in state.worktrees.iter_mut() {
            if wt.branch.as_deref() == Some(old) {
                wt.branch = Some(new.to_string());
            }
        }
        Ok(())
    }

    fn switch(&self, worktree: &Path, branch: &str) -> Result<(), TwigsError> {
        self.record(format!("switch {} {}", worktree.display(), branch));
        self.check("switch", branch)?;

        let mut state = self.state.borrow_mut();
        if !state.branches.contains_key(branch) {
            return Err(git_error(format!("switch {}", branch), "invalid reference"));
        }
        match state.worktrees.iter_mut().find(|w| w.path == worktree) {
            Some(wt) => {
                wt.branch = Some(branch.to_string());
                Ok(())
            }
            None => Err(git_error(format!("switch {}", branch), "not a git repository")),
        }
    }

    fn fetch_all(&self) -> Result<(), TwigsError> {
        self.record("fetch_all".to_string());
        self.check("fetch_all", "")
    }

    fn fetch_pull_ref(
        &self,
        worktree: &Path,
        remote: &str,
        number: u64,
        branch: &str,
    ) -> Result<(), TwigsError> {
        self.record(format!(
            "fetch_pull_ref {} {} {} {}",
            worktree.display(),
            remote,
            number,
            branch
        ));
        self.check("fetch_pull_ref", branch)?;
        self.state
            .borrow_mut()
            .branches
            .entry(branch.to_string())
            .or_default();
        Ok(())
    }

    fn change_count(&self, worktree: &Path) -> Result<usize, TwigsError> {
        Ok(self
            .state
            .borrow()
            .changes
            .get(worktree)
            .copied()
            .unwrap_or(0))
    }

    fn in_progress(&self, worktree: &Path) -> Option<InProgressOp> {
        self.state.borrow().in_progress.get(worktree).copied()
    }

    fn upstream_sync(&self, worktree: &Path) -> Option<(usize, usize)> {
        self.state.borrow().sync.get(worktree).copied()
    }
}

/// Scripted `gh` stand-in
pub struct FakeHosting {
    pub available: bool,
    pub user: Option<String>,
    pub pulls: HashMap<u64, String>,
    pub checkout_fails: bool,
    calls: RefCell<Vec<String>>,
}

impl FakeHosting {
    pub fn new() -> Self {
        Self {
            available: true,
            user: None,
            pulls: HashMap::new(),
            checkout_fails: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn missing() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    pub fn with_pull(mut self, number: u64, branch: &str) -> Self {
        self.pulls.insert(number, branch.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Hosting for FakeHosting {
    fn is_available(&self) -> bool {
        self.available
    }

    fn current_user(&self) -> Option<String> {
        self.user.clone()
    }

    fn pr_head_branch(&self, number: u64) -> Result<String, TwigsError> {
        self.calls.borrow_mut().push(format!("pr_view {}", number));
        self.pulls
            .get(&number)
            .cloned()
            .ok_or_else(|| TwigsError::HostingCommand(format!("no pull request #{}", number)))
    }

    fn checkout_pr(&self, worktree: &Path, number: u64, branch: &str) -> Result<(), TwigsError> {
        self.calls.borrow_mut().push(format!(
            "pr_checkout {} {} {}",
            worktree.display(),
            number,
            branch
        ));
        if self.checkout_fails {
            return Err(TwigsError::HostingCommand("checkout refused".to_string()));
        }
        Ok(())
    }
}

/// One queued answer for `ScriptedUi`
#[derive(Debug, Clone)]
pub enum Answer {
    Select(usize),
    Confirm(bool),
    Text(String),
    Fail(InteractionError),
}

/// Interaction double that replays queued answers and records output
///
/// A non-interactive instance answers every prompt with `NonTty`. An
/// interactive one panics when a prompt arrives that was not scripted.
pub struct ScriptedUi {
    interactive: bool,
    answers: RefCell<VecDeque<Answer>>,
    prompts: RefCell<Vec<String>>,
    output: RefCell<Vec<String>>,
}

impl ScriptedUi {
    pub fn interactive(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            interactive: true,
            answers: RefCell::new(answers.into_iter().collect()),
            prompts: RefCell::new(Vec::new()),
            output: RefCell::new(Vec::new()),
        }
    }

    pub fn headless() -> Self {
        Self {
            interactive: false,
            ..Self::interactive(std::iter::empty())
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    /// Everything printed, prefixed with its level
    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }

    pub fn printed(&self, needle: &str) -> bool {
        self.output.borrow().iter().any(|line| line.contains(needle))
    }

    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next(&self, prompt: &str) -> InteractionResult<Answer> {
        self.prompts.borrow_mut().push(prompt.to_string());
        if !self.interactive {
            return Err(InteractionError::NonTty);
        }
        match self.answers.borrow_mut().pop_front() {
            Some(Answer::Fail(err)) => Err(err),
            Some(answer) => Ok(answer),
            None => panic!("unscripted prompt: {}", prompt),
        }
    }

    fn print(&self, level: &str, message: &str) {
        self.output
            .borrow_mut()
            .push(format!("{}: {}", level, message));
    }
}

impl InteractionAdapter for ScriptedUi {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn ask_select(&self, prompt: &str, options: &[String]) -> InteractionResult<usize> {
        match self.next(prompt)? {
            Answer::Select(index) => {
                assert!(index < options.len(), "selection {} out of range", index);
                Ok(index)
            }
            other => panic!("expected a selection for '{}', got {:?}", prompt, other),
        }
    }

    fn ask_confirm(&self, prompt: &str, _default: bool) -> InteractionResult<bool> {
        match self.next(prompt)? {
            Answer::Confirm(yes) => Ok(yes),
            other => panic!("expected a confirmation for '{}', got {:?}", prompt, other),
        }
    }

    fn ask_confirm_timeout(&self, prompt: &str, _timeout: Duration) -> InteractionResult<bool> {
        self.ask_confirm(prompt, false)
    }

    fn ask_text(&self, prompt: &str, default: Option<&str>) -> InteractionResult<String> {
        match self.next(prompt)? {
            Answer::Text(text) if text.is_empty() => Ok(default.unwrap_or_default().to_string()),
            Answer::Text(text) => Ok(text),
            other => panic!("expected text for '{}', got {:?}", prompt, other),
        }
    }

    fn start_progress(&self, message: &str) -> ProgressHandle {
        self.print("progress", message);
        ProgressHandle::new(0, message)
    }

    fn end_progress(&self, handle: ProgressHandle, success: bool) {
        let state = if success { "done" } else { "failed" };
        self.print(state, handle.message());
    }

    fn print_info(&self, message: &str) {
        self.print("info", message);
    }

    fn print_warning(&self, message: &str) {
        self.print("warning", message);
    }

    fn print_error(&self, message: &str) {
        self.print("error", message);
    }

    fn print_success(&self, message: &str) {
        self.print("success", message);
    }

    fn print_header(&self, message: &str) {
        self.print("header", message);
    }
}

/// Launcher that only records what it was asked to open
#[derive(Default)]
pub struct RecordingLauncher {
    launched: RefCell<Vec<String>>,
}

impl RecordingLauncher {
    pub fn launched(&self) -> Vec<String> {
        self.launched.borrow().clone()
    }
}

impl Launcher for RecordingLauncher {
    fn open_editor(&self, path: &Path) -> Result<(), TwigsError> {
        self.launched
            .borrow_mut()
            .push(format!("editor {}", path.display()));
        Ok(())
    }

    fn show_diff(&self, path: &Path) -> Result<(), TwigsError> {
        self.launched
            .borrow_mut()
            .push(format!("diff {}", path.display()));
        Ok(())
    }
}

/// Words written to the fixture word list; only the first three survive
/// the length and case filter
pub const FIXTURE_WORDS: &str = "amber\nbirch\ncedar\nZebra\nox\nextraordinary\nnaïve\n";

/// A repository rooted in a temporary directory with fake ports
///
/// The root and its `.git` directory exist on disk so ignore-file and
/// destination checks behave as they would in a real checkout.
pub struct Fixture {
    _dir: TempDir,
    pub root: PathBuf,
    pub ctx: RepoContext,
    pub vcs: FakeVcs,
    pub hosting: FakeHosting,
    pub ui: ScriptedUi,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_ui(ScriptedUi::headless())
    }

    pub fn with_ui(ui: ScriptedUi) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().canonicalize().expect("canonical tempdir");
        let root = base.join("repo");
        fs::create_dir_all(root.join(".git")).expect("create .git");
        let words = base.join("words");
        fs::write(&words, FIXTURE_WORDS).expect("write words");

        let mut config = Config::default();
        config.twigs.words_file = words;

        let ctx = RepoContext::new(
            root.clone(),
            root.join(".git"),
            root.clone(),
            "main".to_string(),
            config,
        )
        .with_os_user(Some("tester".to_string()));

        Self {
            _dir: dir,
            vcs: FakeVcs::new(root.clone()),
            hosting: FakeHosting::new().with_user("octo"),
            ui,
            root,
            ctx,
        }
    }

    /// Path under the conventional worktree directory
    pub fn wt(&self, name: &str) -> PathBuf {
        self.root.join(".worktrees").join(name)
    }

    /// Register a linked worktree and create its directory
    pub fn linked(&self, name: &str, branch: Option<&str>) -> PathBuf {
        let path = self.wt(name);
        fs::create_dir_all(&path).expect("create worktree dir");
        self.vcs.add_worktree(path.clone(), branch);
        path
    }

    pub fn manager(&self) -> Manager<'_> {
        Manager::new(&self.ctx, &self.vcs, &self.hosting, &self.ui)
    }

    pub fn exclude_file(&self) -> String {
        fs::read_to_string(self.root.join(".git").join("info").join("exclude")).unwrap_or_default()
    }
}
