//! Query resolution: one user-supplied string to exactly one worktree
//!
//! Matching runs in tiers and the first tier with any member wins:
//! branch or absolute path equality, then the shorter path forms, then
//! shell-glob, then substring. Several
//! members go to interactive selection when a terminal is available and are
//! otherwise reported as ambiguous.

use std::path::Path;

use globset::{Glob, GlobMatcher};
use tracing::debug;

use crate::context::RepoContext;
use crate::error::TwigsError;
use crate::interaction::{InteractionAdapter, InteractionError};
use crate::types::Worktree;

/// Tier that produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    Glob,
    Substring,
}

/// Whether `query` is the branch or the absolute path of `worktree`
fn is_exact(worktree: &Worktree, query: &str) -> bool {
    let trimmed = trim_trailing_slash(query);
    worktree.branch.as_deref() == Some(trimmed) || worktree.path == Path::new(trimmed)
}

/// Whether `query` names `worktree` by a shorter path form
///
/// Accepts the path relative to the repository root, the final path
/// component, and a path relative to the caller.
fn is_path_alias(ctx: &RepoContext, worktree: &Worktree, query: &str) -> bool {
    let trimmed = trim_trailing_slash(query);
    let path = &worktree.path;
    worktree.display_path(&ctx.repo_root) == trimmed
        || path.file_name().is_some_and(|name| name == trimmed)
        || *path == ctx.absolutize(Path::new(trimmed))
}

fn trim_trailing_slash(query: &str) -> &str {
    let trimmed = query.trim_end_matches('/');
    if trimmed.is_empty() { query } else { trimmed }
}

fn glob_matcher(query: &str) -> Option<GlobMatcher> {
    if !query.contains(['*', '?', '[']) {
        return None;
    }
    match Glob::new(query) {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(e) => {
            debug!(query, error = %e, "query is not a valid glob");
            None
        }
    }
}

fn glob_matches(ctx: &RepoContext, matcher: &GlobMatcher, worktree: &Worktree) -> bool {
    let branch = worktree.branch.as_deref().is_some_and(|b| matcher.is_match(b));
    branch
        || matcher.is_match(&worktree.path)
        || matcher.is_match(worktree.display_path(&ctx.repo_root))
        || worktree
            .path
            .file_name()
            .is_some_and(|name| matcher.is_match(name))
}

fn substring_matches(ctx: &RepoContext, worktree: &Worktree, query: &str) -> bool {
    worktree.branch.as_deref().is_some_and(|b| b.contains(query))
        || worktree.display_path(&ctx.repo_root).contains(query)
}

/// Members of the first non-empty tier
pub fn match_tier<'a>(
    ctx: &RepoContext,
    candidates: &'a [Worktree],
    query: &str,
) -> Option<(MatchTier, Vec<&'a Worktree>)> {
    let exact: Vec<&Worktree> = candidates.iter().filter(|w| is_exact(w, query)).collect();
    if !exact.is_empty() {
        return Some((MatchTier::Exact, exact));
    }

    let aliased: Vec<&Worktree> = candidates
        .iter()
        .filter(|w| is_path_alias(ctx, w, query))
        .collect();
    if !aliased.is_empty() {
        return Some((MatchTier::Exact, aliased));
    }

    if let Some(matcher) = glob_matcher(query) {
        let globbed: Vec<&Worktree> = candidates
            .iter()
            .filter(|w| glob_matches(ctx, &matcher, w))
            .collect();
        if !globbed.is_empty() {
            return Some((MatchTier::Glob, globbed));
        }
    }

    let partial: Vec<&Worktree> = candidates
        .iter()
        .filter(|w| substring_matches(ctx, w, query))
        .collect();
    if !partial.is_empty() {
        return Some((MatchTier::Substring, partial));
    }

    None
}

/// Selector line for a worktree: `branch  path`
pub fn candidate_label(ctx: &RepoContext, worktree: &Worktree) -> String {
    format!(
        "{}  {}",
        worktree.branch_label(),
        worktree.display_path(&ctx.repo_root)
    )
}

/// Resolve `query` against `candidates`
///
/// An empty or missing query hands every candidate to the selector.
pub fn resolve(
    ctx: &RepoContext,
    ui: &dyn InteractionAdapter,
    candidates: &[Worktree],
    query: Option<&str>,
) -> Result<Worktree, TwigsError> {
    let query = query.map(str::trim).unwrap_or_default();

    if query.is_empty() {
        if candidates.is_empty() {
            return Err(TwigsError::WorktreeNotFound {
                query: "*".to_string(),
            });
        }
        let all: Vec<&Worktree> = candidates.iter().collect();
        return select(ctx, ui, &all, "no worktree given");
    }

    let Some((tier, matches)) = match_tier(ctx, candidates, query) else {
        return Err(TwigsError::WorktreeNotFound {
            query: query.to_string(),
        });
    };
    debug!(query, ?tier, count = matches.len(), "resolver matches");

    if let [single] = matches.as_slice() {
        return Ok((*single).clone());
    }

    if !ui.is_interactive() {
        return Err(TwigsError::AmbiguousWorktree {
            query: query.to_string(),
            candidates: matches
                .iter()
                .map(|w| format!("  {}  {}", w.branch_label(), w.path.display()))
                .collect(),
        });
    }
    select(ctx, ui, &matches, "several worktrees match")
}

fn select(
    ctx: &RepoContext,
    ui: &dyn InteractionAdapter,
    options: &[&Worktree],
    reason: &str,
) -> Result<Worktree, TwigsError> {
    let labels: Vec<String> = options.iter().map(|w| candidate_label(ctx, w)).collect();
    match ui.ask_select("Select a worktree", &labels) {
        Ok(index) => options
            .get(index)
            .map(|w| (*w).clone())
            .ok_or_else(|| InteractionError::InvalidInput(format!("no option {}", index)).into()),
        Err(InteractionError::NonTty) => Err(TwigsError::SelectorUnavailable {
            reason: reason.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}
