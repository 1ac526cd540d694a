//! Per-run backup records of conflicting destinations.
use anyhow::{Context as _, Result};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::conflict::Conflict;
use crate::config::stow::is_plain_name;

/// Format of the per-run directory name.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A timestamped directory holding one diagnostic log per conflicted package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    dir: PathBuf,
}

impl BackupRecord {
    /// Create `<backup_dir>/<timestamp>/` for this run.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create(backup_dir: &Path) -> Result<Self> {
        let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::create_named(backup_dir, &stamp)
    }

    /// Create a fresh `<backup_dir>/<name>/`.
    ///
    /// If that directory already exists (two runs within the same second),
    /// `<name>_1`, `<name>_2`, … are tried instead so runs never share logs.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create_named(backup_dir: &Path, name: &str) -> Result<Self> {
        fs::create_dir_all(backup_dir)
            .with_context(|| format!("creating backup directory {}", backup_dir.display()))?;
        let mut dir = backup_dir.join(name);
        let mut attempt = 0u32;
        loop {
            match fs::create_dir(&dir) {
                Ok(()) => return Ok(Self { dir }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    attempt += 1;
                    dir = backup_dir.join(format!("{name}_{attempt}"));
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("creating backup directory {}", dir.display()));
                }
            }
        }
    }

    /// The run directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Render the diagnostic log for one package.
///
/// Lists each conflicting path with what occupies it. The log never
/// contains a command; resolution is left to the user.
#[must_use]
pub fn render_log(package: &str, conflicts: &[Conflict]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "package: {package}");
    let _ = writeln!(out, "conflicts: {}", conflicts.len());
    for conflict in conflicts {
        let _ = writeln!(out, "{} ({})", conflict.destination.display(), conflict.kind);
    }
    out.push_str("# These paths were left untouched. Move them aside and re-run to link.\n");
    out
}

/// Write `<record>/<package>.log` describing `conflicts`. Never moves or
/// deletes the conflicting entries themselves.
///
/// # Errors
///
/// Returns an error if `package` is not a single plain name or the log
/// cannot be written.
pub fn backup(conflicts: &[Conflict], record: &BackupRecord, package: &str) -> Result<PathBuf> {
    if !is_plain_name(package) {
        anyhow::bail!("refusing to write backup log for package '{package}': not a plain name");
    }
    let path = record.dir.join(format!("{package}.log"));
    fs::write(&path, render_log(package, conflicts))
        .with_context(|| format!("writing backup log {}", path.display()))?;
    Ok(path)
}
