//! twigs-core: Core library for the twigs git-worktree manager
//!
//! This crate holds the registry model, name generation, query resolution,
//! lifecycle operations, staleness analysis and the dashboard loop. External
//! programs (git, gh, the terminal, editors) are reached only through ports so
//! everything here runs against fakes in tests.

/// Core error types for twigs operations
pub mod error;

/// Configuration handling
pub mod config;

/// Core data types (Worktree, status columns, removal candidates, navigation)
pub mod types;

/// Interaction port for prompts and output
pub mod interaction;

/// Version-control port and the git CLI implementation
pub mod vcs;

/// Code-hosting port and the gh CLI implementation
pub mod hosting;

/// Worktree registry parsing
pub mod registry;

/// Repository context threaded through every operation
pub mod context;

/// Generated branch names and conventional paths
pub mod naming;

/// Query to worktree resolution
pub mod resolver;

/// Add, remove, move, extract and pull request checkout
pub mod lifecycle;

/// Stale worktree and branch detection (`twigs world`)
pub mod staleness;

/// Dashboard read model and action loop
pub mod dashboard;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use context::RepoContext;
pub use dashboard::{Dashboard, DashboardAction, Launcher};
pub use error::TwigsError;
pub use hosting::{GhCli, Hosting};
pub use interaction::{InteractionAdapter, InteractionError, InteractionResult, ProgressHandle};
pub use lifecycle::{AddRequest, Manager, MoveRequest, RemoveOutcome};
pub use staleness::CleanupReport;
pub use types::{
    CandidateTarget, InProgressOp, Navigation, Outcome, RemovalCandidate, RemovalReason,
    SyncState, Worktree, WorktreeStatus,
};
pub use vcs::{GitCli, Vcs, WorktreeSource};
