//! CLI argument parsing with clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// twigs - create, find, move and clean up git worktrees
#[derive(Parser, Debug)]
#[command(name = "twigs")]
#[command(version = VERSION)]
#[command(about = "Create, find, move and clean up git worktrees")]
#[command(
    long_about = "twigs manages the linked worktrees of one git repository.\n\nRun without a subcommand in a terminal to open the dashboard. Set TWIGS_NO_TUI to print this help instead.\n\nCommands that end inside another worktree replace the process with your $SHELL rooted there. Without a terminal they print the path instead, so `cd \"$(twigs cd foo)\"` works in scripts."
)]
pub struct Cli {
    /// Show debug logs on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive dashboard
    Tui,

    /// Create a worktree for a new or existing branch
    ///
    /// Without a branch a name is generated from your identity and two
    /// random words. Without a path the worktree goes under the worktree
    /// directory (default `.worktrees/`).
    #[command(visible_aliases = ["new", "create"])]
    Add {
        /// Branch to check out, created from the default branch if missing
        branch: Option<String>,

        /// Destination, relative to the current directory
        path: Option<PathBuf>,

        /// Stay in the current directory
        #[arg(long)]
        no_cd: bool,

        /// Base a new branch on the current branch instead of the default branch
        #[arg(short = 'c', long)]
        current_branch: bool,
    },

    /// Check out a pull request into its own worktree
    #[command(visible_alias = "co")]
    Checkout {
        /// Pull request number, `#number`, or URL
        reference: String,

        /// Stay in the current directory
        #[arg(long)]
        no_cd: bool,
    },

    /// Pull request commands
    #[command(subcommand)]
    Pr(PrCommands),

    /// List worktrees (`git worktree list`)
    #[command(visible_alias = "ls")]
    List,

    /// Remove a worktree and its branch
    ///
    /// Without a target, removes the worktree you are standing in.
    #[command(visible_aliases = ["rm", "del", "delete", "bd"])]
    Remove {
        /// Worktree path or branch
        target: Option<String>,

        /// Skip confirmation and discard uncommitted changes
        #[arg(short, long)]
        force: bool,
    },

    /// Move a worktree, or extract the main worktree's branch into one
    #[command(
        visible_alias = "mv",
        long_about = "Move a worktree to a new path.\n\nWhen the target is the main worktree and it is not on the default branch, its branch is moved into a new linked worktree and the main worktree switches back to the default branch."
    )]
    Move {
        /// Worktree to move (path or branch)
        worktree: Option<String>,

        /// Destination, relative to the current directory
        dest: Option<PathBuf>,

        /// Stay in the current directory
        #[arg(long)]
        no_cd: bool,
    },

    /// Drop registry entries for worktrees whose directory is gone
    Prune,

    /// Remove stale worktrees and branches after confirmation
    ///
    /// Candidates: upstream deleted, never pushed without unique commits,
    /// or merged into the default branch.
    #[command(visible_alias = "cleanup")]
    World,

    /// Print the path of a worktree
    Goto {
        /// Branch, path, glob, or substring
        pattern: Option<String>,
    },

    /// Open a shell in a worktree (`-` is the main worktree)
    Cd {
        /// Branch, path, glob, substring, or `-`
        pattern: Option<String>,
    },
}

/// `twigs pr` subcommands
#[derive(Subcommand, Debug)]
pub enum PrCommands {
    /// Check out a pull request into its own worktree
    #[command(name = "co", visible_alias = "checkout")]
    Co {
        /// Pull request number, `#number`, or URL
        reference: String,

        /// Stay in the current directory
        #[arg(long)]
        no_cd: bool,
    },
}

/// Get the command args for use in the application
pub fn parse() -> Cli {
    Cli::parse()
}
