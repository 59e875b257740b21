//! Process replacement for `Navigation::To`
//!
//! A child process cannot change its parent's directory, so relocating means
//! replacing twigs with an interactive shell rooted at the target. Without a
//! terminal there is nobody to hand a shell to, and the path is printed
//! instead so callers can `cd "$(...)"`.

use std::io::IsTerminal;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;
use twigs_core::Navigation;

/// Shell to start when `$SHELL` is unset
const FALLBACK_SHELL: &str = "/bin/sh";

fn user_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_SHELL.to_string())
}

/// Carry out a navigation decision; returns only when no shell was started
pub fn relocate(navigation: &Navigation) -> Result<()> {
    let Navigation::To(dir) = navigation else {
        return Ok(());
    };
    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        println!("{}", dir.display());
        return Ok(());
    }
    exec_shell(dir)
}

#[cfg(unix)]
fn exec_shell(dir: &Path) -> Result<()> {
    use std::os::unix::process::CommandExt;

    let shell = user_shell();
    debug!(shell = %shell, dir = %dir.display(), "replacing process with shell");
    let err = Command::new(&shell).current_dir(dir).exec();
    Err(err).with_context(|| format!("failed to start {} in {}", shell, dir.display()))
}

#[cfg(not(unix))]
fn exec_shell(dir: &Path) -> Result<()> {
    let shell = user_shell();
    debug!(shell = %shell, dir = %dir.display(), "starting nested shell");
    let status = Command::new(&shell)
        .current_dir(dir)
        .status()
        .with_context(|| format!("failed to start {} in {}", shell, dir.display()))?;
    if !status.success() {
        debug!(?status, "nested shell exited with failure");
    }
    Ok(())
}
