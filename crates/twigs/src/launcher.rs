//! Editor and diff launcher used by the dashboard

use std::path::Path;
use std::process::Command;

use tracing::debug;
use twigs_core::{Launcher, TwigsError};

/// Editor used when nothing is configured
const FALLBACK_EDITOR: &str = "vi";

/// Editor command: configured value, then `$VISUAL`, then `$EDITOR`
pub fn editor_command(configured: Option<&str>) -> String {
    let nonblank = |e: &String| !e.trim().is_empty();
    configured
        .map(str::to_string)
        .filter(nonblank)
        .or_else(|| std::env::var("VISUAL").ok().filter(nonblank))
        .or_else(|| std::env::var("EDITOR").ok().filter(nonblank))
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Runs the user's editor and `git diff` in the foreground
pub struct SystemLauncher {
    editor: String,
}

impl SystemLauncher {
    pub fn new(configured_editor: Option<&str>) -> Self {
        Self {
            editor: editor_command(configured_editor),
        }
    }

    fn run(mut command: Command, what: &str) -> Result<(), TwigsError> {
        let status = command.status().map_err(|e| {
            TwigsError::Io(std::io::Error::new(
                e.kind(),
                format!("could not start {}: {}", what, e),
            ))
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(TwigsError::Io(std::io::Error::other(format!(
                "{} exited with {}",
                what, status
            ))))
        }
    }
}

impl Launcher for SystemLauncher {
    fn open_editor(&self, path: &Path) -> Result<(), TwigsError> {
        // Editors such as "code --wait" carry their own arguments
        let mut parts = self.editor.split_whitespace();
        let program = parts.next().unwrap_or(FALLBACK_EDITOR);
        let mut command = Command::new(program);
        command.args(parts).arg(path).current_dir(path);
        debug!(editor = %self.editor, path = %path.display(), "opening editor");
        Self::run(command, program)
    }

    fn show_diff(&self, path: &Path) -> Result<(), TwigsError> {
        let mut command = Command::new("git");
        command.arg("-C").arg(path).args(["diff", "HEAD"]);
        debug!(path = %path.display(), "showing diff");
        Self::run(command, "git diff")
    }
}
