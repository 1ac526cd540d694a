//! File-system resource helpers.
use anyhow::{Context as _, Result};
use std::path::{Component, Path, PathBuf};

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Lexically normalize `path`: drop `.` components and fold `..` into the
/// preceding component. Does not touch the filesystem.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Read the link at `link` and return the path its text designates,
/// resolving relative link text against the link's parent directory.
///
/// Returns `None` if `link` is not a symlink.
#[must_use]
pub fn link_destination(link: &Path) -> Option<PathBuf> {
    let text = std::fs::read_link(link).ok()?;
    if text.is_absolute() {
        return Some(normalize(&text));
    }
    let parent = link.parent().unwrap_or_else(|| Path::new(""));
    Some(normalize(&parent.join(text)))
}

/// Whether `path` already leads to `expected`.
///
/// True when `path` is a symlink whose (absolute or relative) text resolves
/// to `expected`, or when both paths canonicalize to the same entry, which
/// covers destinations reached through an already-linked parent directory.
#[must_use]
pub fn points_to(path: &Path, expected: &Path) -> bool {
    if link_destination(path).is_some_and(|dest| dest == normalize(expected)) {
        return true;
    }
    match (dunce::canonicalize(path), dunce::canonicalize(expected)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
