// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed dotfiles repository with its own
// home and cache directories, so each test runs in isolation.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// An isolated dotfiles root, home directory and cache directory backed by a
/// [`tempfile::TempDir`].
pub struct Sandbox {
    /// Temporary directory holding everything.
    pub dir: tempfile::TempDir,
}

impl Sandbox {
    /// Create `root/conf`, `home` and `cache`.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        for sub in ["root/conf", "home", "cache"] {
            fs::create_dir_all(dir.path().join(sub)).expect("create sandbox dir");
        }
        Self { dir }
    }

    /// Dotfiles root.
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("root")
    }

    /// Home directory.
    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    /// Cache directory (`XDG_CACHE_HOME`).
    pub fn cache(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    /// Directory holding per-run backup records.
    pub fn backups(&self) -> PathBuf {
        self.home().join(".dotfiles-backup")
    }

    /// Write `conf/<name>`.
    pub fn conf(&self, name: &str, content: &str) {
        fs::write(self.root().join("conf").join(name), content).expect("write config file");
    }

    /// Write a file into a package source tree, e.g. `pkg("hypr", ".config/hypr/x")`.
    pub fn pkg(&self, package: &str, rel: &str) {
        write_file(&self.root().join(package).join(rel), rel);
    }

    /// Write a pre-existing file into the home directory.
    pub fn home_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.home().join(rel);
        write_file(&path, content);
        path
    }

    /// Every per-run backup directory created so far.
    pub fn backup_runs(&self) -> Vec<PathBuf> {
        fs::read_dir(self.backups()).map_or_else(
            |_| Vec::new(),
            |entries| entries.map(|e| e.expect("read backup entry").path()).collect(),
        )
    }
}

fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().expect("path has parent")).expect("create parent dirs");
    fs::write(path, content).expect("write file");
}
