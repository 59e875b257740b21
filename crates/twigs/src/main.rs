//! twigs CLI - create, find, move and clean up git worktrees

mod cli;
mod colors;
mod commands;
mod interaction;
mod launcher;
mod logging;
mod shell;

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::CommandFactory;

use cli::{Commands, PrCommands};

/// Whether a bare `twigs` should open the dashboard
fn dashboard_allowed() -> bool {
    let disabled = std::env::var("TWIGS_NO_TUI").is_ok_and(|v| !v.is_empty());
    !disabled && std::io::stdin().is_terminal()
}

fn main() -> ExitCode {
    let cli = cli::parse();
    logging::init_tracing(cli.verbose);
    let quiet = cli.quiet;

    let result = match cli.command {
        Some(Commands::Tui) => commands::run_tui(quiet),
        Some(Commands::Add {
            branch,
            path,
            no_cd,
            current_branch,
        }) => commands::run_add(branch, path, no_cd, current_branch, quiet),
        Some(Commands::Checkout { reference, no_cd })
        | Some(Commands::Pr(PrCommands::Co { reference, no_cd })) => {
            commands::run_checkout_pr(&reference, no_cd, quiet)
        }
        Some(Commands::List) => commands::run_list(quiet),
        Some(Commands::Remove { target, force }) => commands::run_remove(target, force, quiet),
        Some(Commands::Move {
            worktree,
            dest,
            no_cd,
        }) => commands::run_move(worktree, dest, no_cd, quiet),
        Some(Commands::Prune) => commands::run_prune(quiet),
        Some(Commands::World) => commands::run_world(quiet),
        Some(Commands::Goto { pattern }) => commands::run_goto(pattern, quiet),
        Some(Commands::Cd { pattern }) => commands::run_cd(pattern, quiet),
        None if dashboard_allowed() => commands::run_tui(quiet),
        None => cli::Cli::command()
            .print_help()
            .map(|_| 0)
            .map_err(anyhow::Error::from),
    };

    match result {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
