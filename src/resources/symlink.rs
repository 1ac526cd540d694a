//! Symlink resource.
use anyhow::{Context as _, Result};
use std::io;
use std::path::PathBuf;

use super::helpers::fs::{ensure_parent_dir, link_destination, points_to};
use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::exec::Executor;

/// A symlink at `target` pointing to `source`.
///
/// When `elevated` is set, the link is created and removed with `sudo`
/// through that executor; otherwise the filesystem is modified directly.
/// An occupied `target` is never replaced.
#[derive(Debug, Clone)]
pub struct SymlinkResource<'a> {
    /// The file the symlink points to.
    pub source: PathBuf,
    /// Where the symlink is created.
    pub target: PathBuf,
    elevated: Option<&'a dyn Executor>,
}

impl<'a> SymlinkResource<'a> {
    /// Create a symlink resource modified directly by this process.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self {
            source,
            target,
            elevated: None,
        }
    }

    /// Create a symlink resource modified through `sudo`.
    #[must_use]
    pub const fn elevated(source: PathBuf, target: PathBuf, executor: &'a dyn Executor) -> Self {
        Self {
            source,
            target,
            elevated: Some(executor),
        }
    }

    fn create(&self) -> Result<()> {
        if let Some(executor) = self.elevated {
            let target = self.target.to_string_lossy();
            let source = self.source.to_string_lossy();
            if let Some(parent) = self.target.parent() {
                executor.run("sudo", &["mkdir", "-p", "--", &parent.to_string_lossy()])?;
            }
            executor.run("sudo", &["ln", "-s", "-T", "--", &source, &target])?;
        } else {
            ensure_parent_dir(&self.target)?;
            std::os::unix::fs::symlink(&self.source, &self.target).with_context(|| {
                format!(
                    "creating symlink {} -> {}",
                    self.target.display(),
                    self.source.display()
                )
            })?;
        }
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        if let Some(executor) = self.elevated {
            executor.run("sudo", &["rm", "--", &self.target.to_string_lossy()])?;
        } else {
            std::fs::remove_file(&self.target)
                .with_context(|| format!("removing symlink: {}", self.target.display()))?;
        }
        Ok(())
    }
}

impl Applicable for SymlinkResource<'_> {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    fn apply(&self) -> Result<ResourceChange> {
        match self.current_state()? {
            ResourceState::Correct => Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Missing => {
                self.create()?;
                Ok(ResourceChange::Applied)
            }
            ResourceState::Incorrect { current } => Ok(ResourceChange::Skipped {
                reason: format!("destination occupied: {current}"),
            }),
            ResourceState::Invalid { reason } => Ok(ResourceChange::Skipped { reason }),
        }
    }

    fn remove(&self) -> Result<ResourceChange> {
        // Only a link at `target` itself is ours to remove; a destination
        // reached through a linked parent directory belongs to that parent.
        if link_destination(&self.target).is_none() || !points_to(&self.target, &self.source) {
            return Ok(ResourceChange::Skipped {
                reason: "not linked to source".to_string(),
            });
        }
        self.delete()?;
        Ok(ResourceChange::Applied)
    }
}

impl Resource for SymlinkResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        if !self.source.exists() {
            return Ok(ResourceState::Invalid {
                reason: format!("source does not exist: {}", self.source.display()),
            });
        }

        let meta = match std::fs::symlink_metadata(&self.target) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ResourceState::Missing),
            Err(e) if e.kind() == io::ErrorKind::NotADirectory => {
                return Ok(ResourceState::Invalid {
                    reason: "a parent path is not a directory".to_string(),
                });
            }
            Err(e) => {
                return Err(e).with_context(|| format!("inspecting {}", self.target.display()));
            }
        };

        if points_to(&self.target, &self.source) {
            return Ok(ResourceState::Correct);
        }

        let current = if meta.is_symlink() {
            link_destination(&self.target).map_or_else(
                || "unreadable symlink".to_string(),
                |dest| format!("points to {}", dest.display()),
            )
        } else if meta.is_dir() {
            "target is a real directory".to_string()
        } else {
            "target is a regular file".to_string()
        };
        Ok(ResourceState::Incorrect { current })
    }
}
