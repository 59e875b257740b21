//! Generated branch names and conventional worktree paths

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::context::RepoContext;
use crate::error::TwigsError;
use crate::hosting::Hosting;
use crate::vcs::Vcs;

/// Generation attempts before falling back to a random suffix
pub const MAX_NAME_ATTEMPTS: usize = 8;

const MIN_WORD_LEN: usize = 3;
const MAX_WORD_LEN: usize = 7;
const FALLBACK_IDENTITY: &str = "user";

/// Lowercase, ref-safe slug: runs of anything but `[a-z0-9]` become one `-`
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Identity prefix for generated branches
///
/// Hosting login, then the configured git user name, then the OS user.
/// Resolved once per context.
pub fn resolve_identity(ctx: &RepoContext, vcs: &dyn Vcs, hosting: &dyn Hosting) -> String {
    ctx.identity_or_init(|| {
        let chain = [
            hosting.current_user(),
            vcs.config_value("user.name"),
            ctx.os_user.clone(),
        ];
        let identity = chain
            .into_iter()
            .flatten()
            .map(|candidate| slugify(&candidate))
            .find(|slug| !slug.is_empty())
            .unwrap_or_else(|| FALLBACK_IDENTITY.to_string());
        debug!(identity = %identity, "resolved identity");
        identity
    })
    .to_string()
}

/// Short lowercase ASCII words from a word list; empty when unreadable
pub fn load_words(path: &Path) -> Vec<String> {
    let Ok(content) = fs::read_to_string(path) else {
        debug!(path = %path.display(), "word list unavailable");
        return Vec::new();
    };
    content
        .lines()
        .map(str::trim)
        .filter(|w| (MIN_WORD_LEN..=MAX_WORD_LEN).contains(&w.len()))
        .filter(|w| w.bytes().all(|b| b.is_ascii_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Random index below `len` (non-zero), with a slight modulo bias
pub fn random_index(len: usize) -> usize {
    (Uuid::new_v4().as_u128() % len as u128) as usize
}

/// `len` random lowercase hex digits (at most 32)
pub fn random_hex(len: usize) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..len.min(hex.len())].to_string()
}

/// `{identity}/{word}-{word}`, or `{identity}/{hex}` without words
pub fn generate_branch_name(
    identity: &str,
    words: &[String],
    pick: &mut dyn FnMut(usize) -> usize,
) -> String {
    if words.is_empty() {
        return format!("{}/{}", identity, random_hex(8));
    }
    let first = &words[pick(words.len())];
    let second = &words[pick(words.len())];
    format!("{}/{}-{}", identity, first, second)
}

/// `<repo>/<worktree_dir>/<branch with separators replaced by '-'>`
pub fn default_path(ctx: &RepoContext, branch: &str) -> PathBuf {
    ctx.worktree_root().join(branch.replace(['/', '\\'], "-"))
}

/// Whether a generated branch collides with a local branch or a directory
fn is_taken(ctx: &RepoContext, vcs: &dyn Vcs, branch: &str) -> bool {
    vcs.ref_exists(&format!("refs/heads/{}", branch)) || default_path(ctx, branch).exists()
}

/// Generate a branch name and its default path that collide with nothing
pub fn generate_unique(
    ctx: &RepoContext,
    vcs: &dyn Vcs,
    identity: &str,
    words: &[String],
) -> (String, PathBuf) {
    generate_unique_with(ctx, vcs, identity, words, &mut random_index)
}

fn generate_unique_with(
    ctx: &RepoContext,
    vcs: &dyn Vcs,
    identity: &str,
    words: &[String],
    pick: &mut dyn FnMut(usize) -> usize,
) -> (String, PathBuf) {
    let mut last = String::new();
    for _ in 0..MAX_NAME_ATTEMPTS {
        let candidate = generate_branch_name(identity, words, pick);
        if !is_taken(ctx, vcs, &candidate) {
            let path = default_path(ctx, &candidate);
            return (candidate, path);
        }
        debug!(branch = %candidate, "generated name already taken");
        last = candidate;
    }

    loop {
        let candidate = format!("{}-{}", last, random_hex(4));
        if !is_taken(ctx, vcs, &candidate) {
            let path = default_path(ctx, &candidate);
            return (candidate, path);
        }
    }
}

/// Register `dir_name` in `<common_dir>/info/exclude`
///
/// Appends `/<dir_name>/` when no equivalent line is present. Returns whether
/// the file changed.
pub fn ensure_ignored(common_dir: &Path, dir_name: &str) -> Result<bool, TwigsError> {
    let name = dir_name.trim_matches('/');
    let entry = format!("/{}/", name);
    let info_dir = common_dir.join("info");
    let exclude = info_dir.join("exclude");

    let existing = match fs::read_to_string(&exclude) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let equivalent = [
        entry.clone(),
        format!("/{}", name),
        format!("{}/", name),
        name.to_string(),
    ];
    if existing
        .lines()
        .map(str::trim)
        .any(|line| equivalent.iter().any(|e| e == line))
    {
        return Ok(false);
    }

    fs::create_dir_all(&info_dir)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&exclude)?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        writeln!(file)?;
    }
    writeln!(file, "{}", entry)?;
    info!(entry = %entry, "registered worktree directory in info/exclude");
    Ok(true)
}
