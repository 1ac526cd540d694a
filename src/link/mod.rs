//! Conflict-aware linking of package trees into their target roots.
//!
//! Each package moves through
//! `planned -> (conflicts detected -> logged) | (no conflicts -> linked)`.
//! Conflicting destinations are written to the run's [`BackupRecord`] and
//! left untouched; every other entry of the package is still linked. There
//! is no transition out of the logged state within a run: the user resolves
//! the listed paths and runs again.
pub mod apply;
pub mod backup;
pub mod conflict;
pub mod plan;
pub mod report;

pub use apply::{ApplyStats, apply, unapply};
pub use backup::{BackupRecord, backup, render_log};
pub use conflict::{Conflict, ConflictKind, detect_conflicts};
pub use plan::{LinkEntry, LinkPlan, plan_links};
pub use report::{PackageOutcome, RunReport};

use anyhow::Result;

use crate::config::stow::{IgnoreSet, StowPackage};
use crate::error::InstallError;
use crate::exec::{Executor, Sudo};
use crate::logging::Log;
use crate::resources::helpers::fs::points_to;

/// Plan a package, or report why it is skipped.
fn plan_or_skip(
    package: &StowPackage,
    ignore: &IgnoreSet,
    log: &dyn Log,
) -> Result<Result<LinkPlan, PackageOutcome>> {
    if !package.source.is_dir() {
        let warning = InstallError::MissingPackageDir {
            package: package.name.clone(),
            path: package.source.clone(),
        };
        log.warn(&warning.to_string());
        return Ok(Err(PackageOutcome::Skipped {
            reason: format!("no directory at {}", package.source.display()),
        }));
    }
    let plan = plan_links(&package.name, &package.source, &package.target, ignore)?;
    if plan.is_empty() {
        return Ok(Err(PackageOutcome::Skipped {
            reason: "nothing to link".to_string(),
        }));
    }
    log.debug(&format!(
        "{}: {} planned links into {}",
        package.name,
        plan.entries.len(),
        package.target.display()
    ));
    Ok(Ok(plan))
}

/// Warn about each conflict and write the package's backup log.
fn record_conflicts(
    plan: &LinkPlan,
    conflicts: &[Conflict],
    record: &BackupRecord,
    log: &dyn Log,
) -> Result<std::path::PathBuf> {
    for conflict in conflicts {
        let warning = InstallError::LinkConflict {
            package: plan.package.clone(),
            path: conflict.destination.clone(),
        };
        log.warn(&format!("{warning} ({})", conflict.kind));
    }
    let path = backup(conflicts, record, &plan.package)?;
    log.info(&format!(
        "{}: {} conflicts logged to {}",
        plan.package,
        conflicts.len(),
        path.display()
    ));
    Ok(path)
}

/// Count entries that are not conflicted and not yet linked.
fn pending_links(plan: &LinkPlan, conflicts: &[Conflict]) -> (usize, usize) {
    let mut pending = 0;
    let mut already = 0;
    for entry in &plan.entries {
        if conflicts.iter().any(|c| c.destination == entry.destination) {
            continue;
        }
        if points_to(&entry.destination, &entry.source) {
            already += 1;
        } else {
            pending += 1;
        }
    }
    (pending, already)
}

/// Elevate for a privileged package, but only when it has work to do.
fn elevation<'s>(
    package: &StowPackage,
    has_work: bool,
    sudo: &'s Sudo,
) -> Result<Option<&'s dyn Executor>, InstallError> {
    if package.privileged && has_work {
        sudo.acquire(&format!("package '{}'", package.name))
            .map(Some)
    } else {
        Ok(None)
    }
}

/// Detect, record and link one package.
///
/// # Errors
///
/// Returns an error if the source tree cannot be read, a backup log cannot
/// be written, a link cannot be created, or privilege cannot be acquired
/// ([`InstallError::PrivilegeFailure`], fatal).
pub fn install_package(
    package: &StowPackage,
    ignore: &IgnoreSet,
    record: &BackupRecord,
    sudo: &Sudo,
    log: &dyn Log,
) -> Result<PackageOutcome> {
    let plan = match plan_or_skip(package, ignore, log)? {
        Ok(plan) => plan,
        Err(skipped) => return Ok(skipped),
    };

    let conflicts = detect_conflicts(&plan);
    let conflict_log = if conflicts.is_empty() {
        None
    } else {
        Some(record_conflicts(&plan, &conflicts, record, log)?)
    };

    let (pending, _) = pending_links(&plan, &conflicts);
    let elevated = elevation(package, pending > 0, sudo)?;
    let stats = apply(&plan, &conflicts, elevated)?;
    log.debug(&format!(
        "{}: {} created, {} already linked",
        package.name, stats.created, stats.already_linked
    ));

    Ok(match conflict_log {
        Some(log_path) => PackageOutcome::Conflicted {
            conflicts,
            log: log_path,
            created: stats.created,
            already_linked: stats.already_linked,
        },
        None => PackageOutcome::Linked {
            created: stats.created,
            already_linked: stats.already_linked,
        },
    })
}

/// Detect and record conflicts for one package without linking anything.
///
/// # Errors
///
/// Returns an error if the source tree cannot be read or a backup log
/// cannot be written.
pub fn check_package(
    package: &StowPackage,
    ignore: &IgnoreSet,
    record: &BackupRecord,
    log: &dyn Log,
) -> Result<PackageOutcome> {
    let plan = match plan_or_skip(package, ignore, log)? {
        Ok(plan) => plan,
        Err(skipped) => return Ok(skipped),
    };

    let conflicts = detect_conflicts(&plan);
    let (pending, already_linked) = pending_links(&plan, &conflicts);
    if conflicts.is_empty() {
        log.dry_run(&format!(
            "{}: no conflicts, would link {pending}",
            package.name
        ));
        return Ok(PackageOutcome::Clean {
            pending,
            already_linked,
        });
    }

    let log_path = record_conflicts(&plan, &conflicts, record, log)?;
    Ok(PackageOutcome::Conflicted {
        conflicts,
        log: log_path,
        created: 0,
        already_linked,
    })
}

/// Remove the links leading into one package.
///
/// # Errors
///
/// Returns an error if the source tree cannot be read, a link cannot be
/// removed, or privilege cannot be acquired.
pub fn remove_package(
    package: &StowPackage,
    ignore: &IgnoreSet,
    sudo: &Sudo,
    log: &dyn Log,
) -> Result<PackageOutcome> {
    let plan = match plan_or_skip(package, ignore, log)? {
        Ok(plan) => plan,
        Err(skipped) => return Ok(skipped),
    };

    let (_, linked) = pending_links(&plan, &[]);
    let elevated = elevation(package, linked > 0, sudo)?;
    let removed = unapply(&plan, elevated)?;
    for path in &removed {
        log.debug(&format!("removed {}", path.display()));
    }
    Ok(PackageOutcome::Unlinked {
        removed: removed.len(),
    })
}
