//! Applying and removing link plans.
use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::conflict::Conflict;
use super::plan::LinkPlan;
use crate::exec::Executor;
use crate::resources::helpers::fs::link_destination;
use crate::resources::symlink::SymlinkResource;
use crate::resources::{Applicable as _, ResourceChange};

/// Counts from one [`apply`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Links created.
    pub created: usize,
    /// Destinations that already led to their source.
    pub already_linked: usize,
    /// Destinations skipped because they were occupied.
    pub skipped: usize,
}

fn resource<'a>(
    source: &Path,
    destination: &Path,
    elevated: Option<&'a dyn Executor>,
) -> SymlinkResource<'a> {
    match elevated {
        Some(executor) => {
            SymlinkResource::elevated(source.to_path_buf(), destination.to_path_buf(), executor)
        }
        None => SymlinkResource::new(source.to_path_buf(), destination.to_path_buf()),
    }
}

/// Link every entry of `plan` whose destination is not listed in
/// `conflicts`, creating missing parent directories.
///
/// Already-correct links are left alone, so applying twice is a no-op. An
/// occupied destination is never overwritten, even if it appeared after
/// conflicts were detected. With `elevated`, links are created through
/// `sudo` on that executor.
///
/// # Errors
///
/// Returns an error if a link or directory cannot be created.
pub fn apply(
    plan: &LinkPlan,
    conflicts: &[Conflict],
    elevated: Option<&dyn Executor>,
) -> Result<ApplyStats> {
    let blocked: HashSet<&Path> = conflicts.iter().map(|c| c.destination.as_path()).collect();
    let mut stats = ApplyStats::default();

    for entry in &plan.entries {
        if blocked.contains(entry.destination.as_path()) {
            stats.skipped += 1;
            continue;
        }
        match resource(&entry.source, &entry.destination, elevated).apply()? {
            ResourceChange::Applied => stats.created += 1,
            ResourceChange::AlreadyCorrect => stats.already_linked += 1,
            ResourceChange::Skipped { reason } => {
                tracing::debug!("skipping {}: {reason}", entry.destination.display());
                stats.skipped += 1;
            }
        }
    }

    Ok(stats)
}

/// Remove links created for `plan`.
///
/// Only symlinks that lead back into the package source tree are removed,
/// both per-file links and directory links covering several entries. Real
/// files and foreign links are never touched. Returns the removed paths.
///
/// # Errors
///
/// Returns an error if a link cannot be removed.
pub fn unapply(plan: &LinkPlan, elevated: Option<&dyn Executor>) -> Result<Vec<PathBuf>> {
    let mut removed: Vec<PathBuf> = Vec::new();

    for entry in &plan.entries {
        if removed.iter().any(|r| entry.destination.starts_with(r)) {
            continue;
        }
        let Some((link, points_to)) = owning_link(plan, &entry.destination) else {
            continue;
        };
        if resource(&points_to, &link, elevated).remove()? == ResourceChange::Applied {
            removed.push(link);
        }
    }

    Ok(removed)
}

/// The outermost symlink between the target root and `destination`
/// (inclusive) whose text leads into the package source tree.
fn owning_link(plan: &LinkPlan, destination: &Path) -> Option<(PathBuf, PathBuf)> {
    let mut candidates: Vec<&Path> = destination
        .ancestors()
        .take_while(|a| a.starts_with(&plan.target_root) && *a != plan.target_root)
        .collect();
    candidates.reverse();
    candidates.into_iter().find_map(|candidate| {
        link_destination(candidate)
            .filter(|dest| dest.starts_with(&plan.source_root))
            .map(|dest| (candidate.to_path_buf(), dest))
    })
}
