//! Code-hosting port (GitHub via the `gh` CLI)

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::error::TwigsError;

static PULL_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://\S+/pull/(\d+)(?:[/?#]\S*)?$").expect("valid regex"));

static PR_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#?(\d+)$").expect("valid regex"));

/// Parse a pull request reference: `123`, `#123` or a URL with `/pull/123`
pub fn parse_pr_reference(input: &str) -> Result<u64, TwigsError> {
    let trimmed = input.trim();
    let digits = PR_NUMBER
        .captures(trimmed)
        .or_else(|| PULL_URL.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());

    digits
        .and_then(|d| d.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| TwigsError::InvalidPrReference {
            input: input.to_string(),
        })
}

/// Hosting operations used by twigs
pub trait Hosting {
    /// Whether the hosting CLI can be invoked at all
    fn is_available(&self) -> bool;

    /// Login of the authenticated user
    fn current_user(&self) -> Option<String>;

    /// Head branch name of a pull request
    fn pr_head_branch(&self, number: u64) -> Result<String, TwigsError>;

    /// Check out a pull request into `branch` inside `worktree`
    fn checkout_pr(&self, worktree: &Path, number: u64, branch: &str) -> Result<(), TwigsError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrView {
    head_ref_name: String,
}

#[derive(Deserialize)]
struct GhUser {
    login: String,
}

/// `gh` CLI wrapper
pub struct GhCli {
    dir: PathBuf,
}

impl GhCli {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn run_in(&self, dir: &Path, args: &[&str]) -> Result<String, TwigsError> {
        debug!(dir = %dir.display(), "gh {}", args.join(" "));
        let output = Command::new("gh")
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TwigsError::HostingCliMissing
                } else {
                    TwigsError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(TwigsError::HostingCommand(format!(
                "gh {}: {}",
                args.join(" "),
                stderr
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Hosting for GhCli {
    fn is_available(&self) -> bool {
        Command::new("gh")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn current_user(&self) -> Option<String> {
        let out = self.run_in(&self.dir, &["api", "user"]).ok()?;
        let user: GhUser = serde_json::from_str(&out).ok()?;
        Some(user.login).filter(|login| !login.is_empty())
    }

    fn pr_head_branch(&self, number: u64) -> Result<String, TwigsError> {
        let number = number.to_string();
        let out = self.run_in(&self.dir, &["pr", "view", &number, "--json", "headRefName"])?;
        let view: PrView = serde_json::from_str(&out)
            .map_err(|e| TwigsError::HostingCommand(format!("unexpected gh output: {}", e)))?;
        Ok(view.head_ref_name)
    }

    fn checkout_pr(&self, worktree: &Path, number: u64, branch: &str) -> Result<(), TwigsError> {
        let number = number.to_string();
        self.run_in(worktree, &["pr", "checkout", &number, "--branch", branch])
            .map(|_| ())
    }
}
