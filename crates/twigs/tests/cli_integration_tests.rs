//! CLI integration tests for twigs commands
//!
//! Every invocation runs with stdin detached, so relocation prints the target
//! path and confirmations behave as in a script.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

fn twigs_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_twigs"))
}

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Temp dir holding `repo/` (one commit on main) and an isolated config home
fn setup_test_repo() -> (tempfile::TempDir, PathBuf) {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let base = temp.path().canonicalize().expect("canonical temp dir");
    let repo = base.join("repo");
    fs::create_dir(&repo).expect("create repo dir");
    fs::create_dir(base.join("config")).expect("create config dir");

    git(&repo, &["init", "-b", "main"]);
    git(&repo, &["config", "user.name", "Test User"]);
    git(&repo, &["config", "user.email", "test@example.com"]);
    git(&repo, &["config", "commit.gpgsign", "false"]);
    fs::write(repo.join("README.md"), "# test\n").expect("write readme");
    git(&repo, &["add", "."]);
    git(&repo, &["commit", "-m", "Initial commit"]);

    (temp, repo)
}

fn run_twigs(dir: &Path, args: &[&str]) -> Output {
    let config_home = dir
        .parent()
        .map(|p| p.join("config"))
        .unwrap_or_else(|| dir.join("config"));
    Command::new(twigs_binary())
        .args(args)
        .current_dir(dir)
        .env("XDG_CONFIG_HOME", config_home)
        .env("TWIGS_NO_TUI", "1")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("failed to run twigs")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_outside_repository_fails() {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let output = run_twigs(temp.path(), &["goto", "anything"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains("error: not inside a git repository"),
        "{}",
        stderr(&output)
    );
}

#[test]
fn test_no_subcommand_without_terminal_prints_help() {
    let (_temp, repo) = setup_test_repo();
    let output = run_twigs(&repo, &[]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Usage"), "{}", stdout(&output));
}

#[test]
fn test_goto_prints_path() {
    let (_temp, repo) = setup_test_repo();
    let linked = repo.parent().expect("parent").join("side-tree");
    git(&repo, &["worktree", "add", "-b", "side", &linked.to_string_lossy()]);

    let output = run_twigs(&repo, &["goto", "side"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), linked.to_string_lossy());

    let output = run_twigs(&linked, &["goto", "-"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), repo.to_string_lossy());
}

#[test]
fn test_goto_ambiguous_lists_candidates() {
    let (_temp, repo) = setup_test_repo();
    let base = repo.parent().expect("parent").to_path_buf();
    git(&repo, &["worktree", "add", "-b", "bugfix", &base.join("wtB").to_string_lossy()]);
    git(&repo, &["worktree", "add", "-b", "hotfix", &base.join("wtC").to_string_lossy()]);

    let output = run_twigs(&repo, &["goto", "fix"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("bugfix"), "{}", err);
    assert!(err.contains("hotfix"), "{}", err);
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_add_no_cd_creates_worktree_and_stays() {
    let (_temp, repo) = setup_test_repo();

    let output = run_twigs(&repo, &["add", "topic", "--no-cd"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).is_empty(), "{}", stdout(&output));
    assert!(repo.join(".worktrees/topic/README.md").exists());

    let exclude = fs::read_to_string(repo.join(".git/info/exclude")).expect("exclude file");
    assert!(exclude.contains("/.worktrees/"), "{}", exclude);
}

#[test]
fn test_add_without_terminal_prints_destination() {
    let (_temp, repo) = setup_test_repo();

    let output = run_twigs(&repo, &["new", "feature/x"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let expected = repo.join(".worktrees/feature-x");
    assert_eq!(stdout(&output).trim(), expected.to_string_lossy());
    assert!(expected.is_dir());
}

#[test]
fn test_remove_force_deletes_worktree_and_branch() {
    let (_temp, repo) = setup_test_repo();
    let output = run_twigs(&repo, &["add", "doomed", "--no-cd"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run_twigs(&repo, &["rm", "--force", "doomed"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(!repo.join(".worktrees/doomed").exists());

    let branches = Command::new("git")
        .args(["branch", "--list", "doomed"])
        .current_dir(&repo)
        .output()
        .expect("git branch");
    assert!(String::from_utf8_lossy(&branches.stdout).trim().is_empty());
}

#[test]
fn test_remove_without_force_or_terminal_keeps_worktree() {
    let (_temp, repo) = setup_test_repo();
    let output = run_twigs(&repo, &["add", "precious", "--no-cd"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run_twigs(&repo, &["remove", "precious"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(repo.join(".worktrees/precious").exists());
}

#[test]
fn test_remove_main_is_refused() {
    let (_temp, repo) = setup_test_repo();
    let output = run_twigs(&repo, &["remove", "--force", "main"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("main worktree"), "{}", stderr(&output));
}

#[test]
fn test_world_without_terminal_skips() {
    let (_temp, repo) = setup_test_repo();
    git(&repo, &["branch", "abandoned"]);

    let output = run_twigs(&repo, &["world"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("abandoned"), "{}", err);
    assert!(err.contains("skipped"), "{}", err);

    let branches = Command::new("git")
        .args(["branch", "--list", "abandoned"])
        .current_dir(&repo)
        .output()
        .expect("git branch");
    assert!(String::from_utf8_lossy(&branches.stdout).contains("abandoned"));
}

#[test]
fn test_move_on_default_branch_has_nothing_to_extract() {
    let (_temp, repo) = setup_test_repo();
    let output = run_twigs(&repo, &["mv"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("nothing to extract"), "{}", stderr(&output));
}

#[test]
fn test_list_and_prune_pass_through() {
    let (_temp, repo) = setup_test_repo();
    let linked = repo.parent().expect("parent").join("stale-tree");
    git(&repo, &["worktree", "add", "-b", "stale", &linked.to_string_lossy()]);
    fs::remove_dir_all(&linked).expect("remove linked dir");

    let output = run_twigs(&repo, &["ls"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("[stale]"), "{}", stdout(&output));

    let output = run_twigs(&repo, &["prune"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let output = run_twigs(&repo, &["list"]);
    assert!(!stdout(&output).contains(&*linked.to_string_lossy()));
}

#[test]
fn test_checkout_rejects_invalid_reference() {
    let (_temp, repo) = setup_test_repo();
    let output = run_twigs(&repo, &["pr", "co", "not-a-pr"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains("invalid pull request reference"),
        "{}",
        stderr(&output)
    );
}
