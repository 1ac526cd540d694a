//! Link plans: which links a package would create.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::stow::IgnoreSet;
use crate::error::InstallError;

/// A single planned link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    /// File inside the package source tree.
    pub source: PathBuf,
    /// Where the link is created.
    pub destination: PathBuf,
}

/// Every link a package would create, ordered by destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPlan {
    /// Package name.
    pub package: String,
    /// Package source directory.
    pub source_root: PathBuf,
    /// Directory mirrored into.
    pub target_root: PathBuf,
    /// One entry per non-directory entry of the source tree.
    pub entries: Vec<LinkEntry>,
}

impl LinkPlan {
    /// Whether the package has nothing to link.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Map every file under `source_root` to the same relative path under
/// `target_root`.
///
/// Entries whose file name matches `ignore` are excluded together with
/// everything beneath them. Symlinks inside the source tree are planned as
/// files and never followed. Reads the source tree only.
///
/// # Errors
///
/// Returns [`InstallError::MissingPackageDir`] if `source_root` is not a
/// directory, or an I/O error if the tree cannot be read.
pub fn plan_links(
    package: &str,
    source_root: &Path,
    target_root: &Path,
    ignore: &IgnoreSet,
) -> Result<LinkPlan> {
    if !source_root.is_dir() {
        return Err(InstallError::MissingPackageDir {
            package: package.to_string(),
            path: source_root.to_path_buf(),
        }
        .into());
    }

    let mut entries = Vec::new();
    let walker = WalkDir::new(source_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !ignore.matches(&e.file_name().to_string_lossy()));

    for entry in walker {
        let entry =
            entry.with_context(|| format!("reading package tree {}", source_root.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source_root)
            .with_context(|| format!("{} is outside the package", entry.path().display()))?;
        entries.push(LinkEntry {
            source: entry.path().to_path_buf(),
            destination: target_root.join(relative),
        });
    }
    entries.sort_by(|a, b| a.destination.cmp(&b.destination));

    Ok(LinkPlan {
        package: package.to_string(),
        source_root: source_root.to_path_buf(),
        target_root: target_root.to_path_buf(),
        entries,
    })
}
