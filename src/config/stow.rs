//! Stow packages and backup settings (`conf/stow.toml`).
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

use crate::error::ConfigError;

/// File names never linked unless `ignore` overrides the list.
pub const DEFAULT_IGNORE: &[&str] = &[
    ".git",
    ".gitignore",
    ".stow-local-ignore",
    "README*",
    "LICENSE*",
    "COPYING",
];

/// Default backup location, relative to the home directory.
pub const DEFAULT_BACKUP_DIR: &str = "~/.dotfiles-backup";

/// Raw `[[package]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackageEntry {
    name: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    privileged: bool,
}

/// Deserialized shape of `stow.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct StowFile {
    backup_dir: Option<String>,
    ignore: Option<Vec<String>>,
    package: Vec<PackageEntry>,
}

/// A compiled set of file-name glob patterns.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    patterns: Vec<glob::Pattern>,
}

impl IgnoreSet {
    /// Compile `patterns`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] for the first malformed pattern.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p.as_ref()).map_err(|e| ConfigError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    message: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Whether a single path component matches any pattern.
    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(file_name))
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_IGNORE
                .iter()
                .filter_map(|p| glob::Pattern::new(p).ok())
                .collect(),
        }
    }
}

/// A package whose source tree is linked into a target root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StowPackage {
    /// Package name; also the source directory name under the dotfiles root.
    pub name: String,
    /// `<root>/<name>`.
    pub source: PathBuf,
    /// Directory the source tree is mirrored into.
    pub target: PathBuf,
    /// Whether links are created through `sudo`.
    pub privileged: bool,
    /// Target exactly as written in the config, for validation.
    pub(super) raw_target: Option<String>,
}

impl StowPackage {
    /// Build a package rooted at `root` that targets `target` directly.
    #[must_use]
    pub fn new(name: &str, root: &Path, target: &Path, privileged: bool) -> Self {
        Self {
            name: name.to_string(),
            source: root.join(name),
            target: target.to_path_buf(),
            privileged,
            raw_target: None,
        }
    }
}

/// Whether `name` is exactly one ordinary path component, so that it can be
/// joined under the dotfiles root or a backup record without escaping it.
#[must_use]
pub fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(first)), None) if first == name
    )
}

/// Resolved stow configuration.
#[derive(Debug, Clone)]
pub struct StowConfig {
    /// Parent of the per-run timestamped backup directories.
    pub backup_dir: PathBuf,
    /// File names excluded from link plans.
    pub ignore: IgnoreSet,
    /// Packages in configuration order.
    pub packages: Vec<StowPackage>,
}

impl StowConfig {
    /// Resolve a raw `stow.toml` against the dotfiles root and home directory.
    pub(super) fn resolve(file: StowFile, root: &Path, home: &Path) -> Result<Self, ConfigError> {
        let backup_dir = expand_home(
            file.backup_dir.as_deref().unwrap_or(DEFAULT_BACKUP_DIR),
            home,
        );
        let ignore = match &file.ignore {
            Some(patterns) => IgnoreSet::new(patterns)?,
            None => IgnoreSet::default(),
        };
        if let Some(entry) = file.package.iter().find(|e| !is_plain_name(&e.name)) {
            return Err(ConfigError::InvalidPackageName {
                name: entry.name.clone(),
            });
        }
        let packages = file
            .package
            .into_iter()
            .map(|entry| StowPackage {
                source: root.join(&entry.name),
                target: entry
                    .target
                    .as_deref()
                    .map_or_else(|| home.to_path_buf(), |t| expand_home(t, home)),
                privileged: entry.privileged,
                raw_target: entry.target,
                name: entry.name,
            })
            .collect();
        Ok(Self {
            backup_dir,
            ignore,
            packages,
        })
    }

    /// An empty configuration that backs up into `backup_dir`.
    #[must_use]
    pub fn empty(backup_dir: &Path) -> Self {
        Self {
            backup_dir: backup_dir.to_path_buf(),
            ignore: IgnoreSet::default(),
            packages: Vec::new(),
        }
    }
}

/// Expand a leading `~` against `home`; relative paths are taken relative
/// to `home` as well.
#[must_use]
pub fn expand_home(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        return home.join(rest);
    }
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        home.join(path)
    }
}
