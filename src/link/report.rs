//! Per-package outcomes and the aggregated run report.
use std::path::PathBuf;

use super::conflict::Conflict;
use crate::logging::TaskStatus;

/// What happened to one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    /// Every planned link is in place.
    Linked {
        /// Links created in this run.
        created: usize,
        /// Links that were already correct.
        already_linked: usize,
    },
    /// Some destinations were occupied; they were logged and left alone
    /// while the rest of the package was linked.
    Conflicted {
        /// Occupied destinations.
        conflicts: Vec<Conflict>,
        /// Diagnostic log written for them.
        log: PathBuf,
        /// Links created in this run.
        created: usize,
        /// Links that were already correct.
        already_linked: usize,
    },
    /// Inspected without changes and nothing conflicts.
    Clean {
        /// Links a stow run would create.
        pending: usize,
        /// Links that are already correct.
        already_linked: usize,
    },
    /// Links leading into the package were removed.
    Unlinked {
        /// Removed links.
        removed: usize,
    },
    /// The package was not processed.
    Skipped {
        /// Why.
        reason: String,
    },
}

impl PackageOutcome {
    /// Summary status and detail for this outcome.
    #[must_use]
    pub fn summary(&self) -> (TaskStatus, String) {
        match self {
            Self::Linked {
                created,
                already_linked,
            } => (
                TaskStatus::Ok,
                format!("{created} linked, {already_linked} already ok"),
            ),
            Self::Conflicted {
                conflicts, log, ..
            } => (
                TaskStatus::Conflicted,
                format!("{} conflicts, see {}", conflicts.len(), log.display()),
            ),
            Self::Clean {
                pending,
                already_linked,
            } => (
                TaskStatus::DryRun,
                format!("no conflicts, {pending} to link, {already_linked} already ok"),
            ),
            Self::Unlinked { removed } => (TaskStatus::Ok, format!("{removed} removed")),
            Self::Skipped { reason } => (TaskStatus::Skipped, reason.clone()),
        }
    }
}

/// Outcomes for every package processed in one run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// `(package name, outcome)` pairs.
    pub outcomes: Vec<(String, PackageOutcome)>,
}

impl RunReport {
    /// Record a package outcome.
    pub fn push(&mut self, package: &str, outcome: PackageOutcome) {
        self.outcomes.push((package.to_string(), outcome));
    }

    /// Number of packages left with conflicts.
    #[must_use]
    pub fn conflicted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, PackageOutcome::Conflicted { .. }))
            .count()
    }

    /// Total links created across all packages.
    #[must_use]
    pub fn created(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, o)| match o {
                PackageOutcome::Linked { created, .. }
                | PackageOutcome::Conflicted { created, .. } => *created,
                _ => 0,
            })
            .sum()
    }
}
