//! Error types for twigs operations

use std::path::PathBuf;

use thiserror::Error;

use crate::interaction::InteractionError;

/// Core error type for twigs operations
#[derive(Error, Debug)]
pub enum TwigsError {
    // === Repository errors (T001-T004) ===
    /// T001: Not inside a git repository
    #[error("not inside a git repository")]
    NotAGitRepository,

    /// T002: git executable missing
    #[error("git is not installed or not on PATH")]
    GitNotInstalled,

    /// T003: git older than the worktree commands we rely on
    #[error("git 2.17 or newer is required for worktree move support")]
    GitVersionInsufficient,

    /// T004: the registry has no main worktree (bare repository)
    #[error("repository has no main worktree (bare repositories are not supported)")]
    NoMainWorktree,

    /// A git invocation failed
    #[error("git {args} failed: {stderr}")]
    GitCommand { args: String, stderr: String },

    // === Resolution errors (T010-T012) ===
    /// T010: Nothing matched the query
    #[error("no worktree found matching '{query}'")]
    WorktreeNotFound { query: String },

    /// T011: Several worktrees matched and nobody can pick one
    #[error(
        "multiple worktrees match '{query}':\n{}\nbe more specific or run from a terminal to pick one",
        .candidates.join("\n")
    )]
    AmbiguousWorktree {
        query: String,
        candidates: Vec<String>,
    },

    /// T012: Interactive selection required but unavailable
    #[error("interactive selection is required ({reason}) but no terminal is available")]
    SelectorUnavailable { reason: String },

    // === Lifecycle errors (T020-T026) ===
    /// T020: Attempt to remove the main worktree
    #[error("refusing to remove the main worktree")]
    CannotRemoveMain,

    /// T021: Main worktree is already on the default branch
    #[error("nothing to extract: main worktree is on '{branch}'")]
    NothingToExtract { branch: String },

    /// T022: Branch already has a worktree
    #[error("branch '{branch}' is already checked out at {}", .path.display())]
    BranchCheckedOut { branch: String, path: PathBuf },

    /// T023: Destination already exists
    #[error("destination already exists: {}", .path.display())]
    DestinationExists { path: PathBuf },

    /// T024: Operation needs a branch but HEAD is detached
    #[error("worktree at {} has a detached HEAD", .path.display())]
    DetachedHead { path: PathBuf },

    /// T025: Worktree creation failed after partial progress
    #[error("worktree creation failed: {reason}")]
    WorktreeCreationFailed { reason: String },

    /// T026: Worktree removal failed
    #[error("worktree removal failed: {reason}")]
    WorktreeCleanupFailed { reason: String },

    // === Hosting errors (T030-T033) ===
    /// T030: PR reference is neither a number nor a pull URL
    #[error("invalid pull request reference '{input}' (expected a number or a URL containing /pull/<number>)")]
    InvalidPrReference { input: String },

    /// T031: gh missing
    #[error("the GitHub CLI (gh) is required for this command but was not found")]
    HostingCliMissing,

    /// T032: gh invocation failed
    #[error("gh command failed: {0}")]
    HostingCommand(String),

    /// T033: Every checkout strategy failed
    #[error("could not check out pull request #{number}: {reason}")]
    PrCheckoutFailed { number: u64, reason: String },

    // === IO and system errors ===
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Prompt failure
    #[error("interaction failed: {0}")]
    Interaction(#[from] InteractionError),
}

impl TwigsError {
    /// Get the error code (e.g., "T001", "T010")
    pub fn code(&self) -> &'static str {
        match self {
            TwigsError::NotAGitRepository => "T001",
            TwigsError::GitNotInstalled => "T002",
            TwigsError::GitVersionInsufficient => "T003",
            TwigsError::NoMainWorktree => "T004",
            TwigsError::GitCommand { .. } => "T005",
            TwigsError::WorktreeNotFound { .. } => "T010",
            TwigsError::AmbiguousWorktree { .. } => "T011",
            TwigsError::SelectorUnavailable { .. } => "T012",
            TwigsError::CannotRemoveMain => "T020",
            TwigsError::NothingToExtract { .. } => "T021",
            TwigsError::BranchCheckedOut { .. } => "T022",
            TwigsError::DestinationExists { .. } => "T023",
            TwigsError::DetachedHead { .. } => "T024",
            TwigsError::WorktreeCreationFailed { .. } => "T025",
            TwigsError::WorktreeCleanupFailed { .. } => "T026",
            TwigsError::InvalidPrReference { .. } => "T030",
            TwigsError::HostingCliMissing => "T031",
            TwigsError::HostingCommand(_) => "T032",
            TwigsError::PrCheckoutFailed { .. } => "T033",
            TwigsError::Io(_) => "T040",
            TwigsError::Config(_) => "T041",
            TwigsError::Interaction(_) => "T042",
        }
    }
}
