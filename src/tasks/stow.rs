//! Link Installer steps: stow, backup-only inspection, and unstow.
use anyhow::Result;

use super::{Context, Task, TaskResult, is_fatal};
use crate::config::stow::StowPackage;
use crate::link::{self, BackupRecord, PackageOutcome};
use crate::logging::TaskStatus;

/// Run `step` for every configured package in order, recording each outcome.
///
/// Non-fatal package errors are recorded as failures and the remaining
/// packages still run; a fatal error stops immediately.
fn for_each_package(
    ctx: &Context,
    label: &str,
    mut step: impl FnMut(&StowPackage) -> Result<PackageOutcome>,
) -> Result<()> {
    for package in &ctx.config.stow.packages {
        let name = format!("{label}: {}", package.name);
        match step(package) {
            Ok(outcome) => {
                let (status, message) = outcome.summary();
                ctx.log.record_task(&name, status, Some(&message));
                ctx.report().push(&package.name, outcome);
            }
            Err(e) if is_fatal(&e) => return Err(e),
            Err(e) => {
                ctx.log.error(&format!("{name}: {e:#}"));
                ctx.log
                    .record_task(&name, TaskStatus::Failed, Some(&format!("{e:#}")));
            }
        }
    }
    Ok(())
}

/// Tools needed to create or remove links for privileged packages.
fn privileged_tools(ctx: &Context, tool: &'static str) -> Vec<&'static str> {
    if ctx.config.stow.packages.iter().any(|p| p.privileged) {
        vec!["sudo", tool]
    } else {
        Vec::new()
    }
}

/// Create this run's backup record.
fn open_record(ctx: &Context) -> Result<BackupRecord> {
    let record = BackupRecord::create(&ctx.config.stow.backup_dir)?;
    ctx.log
        .debug(&format!("backup record: {}", record.dir().display()));
    Ok(record)
}

/// Link every configured package, logging conflicts instead of overwriting.
#[derive(Debug)]
pub struct StowPackages;

impl Task for StowPackages {
    fn name(&self) -> &'static str {
        "Stow packages"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.stow.packages.is_empty()
    }

    fn required_tools(&self, ctx: &Context) -> Vec<&'static str> {
        privileged_tools(ctx, "ln")
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let record = open_record(ctx)?;
        let ignore = &ctx.config.stow.ignore;
        for_each_package(ctx, "stow", |package| {
            link::install_package(package, ignore, &record, &ctx.sudo, ctx.log.as_ref())
        })?;

        let report = ctx.report();
        ctx.log.info(&format!(
            "{} links created, {} packages with conflicts",
            report.created(),
            report.conflicted()
        ));
        if report.conflicted() > 0 {
            ctx.log.warn(&format!(
                "resolve the paths listed in {} and run again",
                record.dir().display()
            ));
        }
        Ok(TaskResult::Ok)
    }
}

/// Detect conflicts and write backup logs without changing anything.
#[derive(Debug)]
pub struct BackupOnly;

impl Task for BackupOnly {
    fn name(&self) -> &'static str {
        "Check for conflicts"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.stow.packages.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let record = open_record(ctx)?;
        let ignore = &ctx.config.stow.ignore;
        for_each_package(ctx, "backup", |package| {
            link::check_package(package, ignore, &record, ctx.log.as_ref())
        })?;

        let conflicted = ctx.report().conflicted();
        ctx.log.info(&format!(
            "{conflicted} packages with conflicts, logs in {}",
            record.dir().display()
        ));
        Ok(TaskResult::DryRun)
    }
}

/// Remove links that point into package sources.
#[derive(Debug)]
pub struct UnstowPackages;

impl Task for UnstowPackages {
    fn name(&self) -> &'static str {
        "Unstow packages"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.stow.packages.is_empty()
    }

    fn required_tools(&self, ctx: &Context) -> Vec<&'static str> {
        privileged_tools(ctx, "rm")
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let ignore = &ctx.config.stow.ignore;
        for_each_package(ctx, "unstow", |package| {
            link::remove_package(package, ignore, &ctx.sudo, ctx.log.as_ref())
        })?;
        Ok(TaskResult::Ok)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::InstallError;
    use crate::resources::test_helpers::MockExecutor;
    use crate::tasks::test_helpers::context_with;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    struct Tree {
        dir: tempfile::TempDir,
    }

    impl Tree {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir_all(dir.path().join("home")).unwrap();
            Self { dir }
        }

        fn root(&self) -> PathBuf {
            self.dir.path().join("dots")
        }

        fn home(&self) -> PathBuf {
            self.dir.path().join("home")
        }

        fn backups(&self) -> PathBuf {
            self.dir.path().join("backups")
        }

        fn file(&self, rel: &str) {
            let p = self.root().join(rel);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(p, rel).unwrap();
        }

        fn package(&self, name: &str) -> StowPackage {
            StowPackage::new(name, &self.root(), &self.home(), false)
        }

        fn configure(&self, packages: Vec<StowPackage>) -> impl FnOnce(&mut crate::config::Config) {
            let backups = self.backups();
            move |c| {
                c.stow.backup_dir = backups;
                c.stow.packages = packages;
            }
        }
    }

    fn only_entry(dir: &Path) -> PathBuf {
        let entries: Vec<_> = fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(entries.len(), 1, "{entries:?}");
        entries[0].clone()
    }

    #[test]
    fn stow_links_and_records_each_package() {
        let tree = Tree::new();
        tree.file("hypr/.config/hypr/hyprland.conf");
        tree.file("waybar/.config/waybar/config");
        let existing = tree.home().join(".config/waybar/config");
        fs::create_dir_all(existing.parent().unwrap()).unwrap();
        fs::write(&existing, "mine").unwrap();

        let (ctx, log, _tmp, _guard) = context_with(
            tree.configure(vec![
                tree.package("hypr"),
                tree.package("gone"),
                tree.package("waybar"),
            ]),
            Arc::new(MockExecutor::with_responses(vec![])),
        );

        assert!(matches!(StowPackages.run(&ctx), Ok(TaskResult::Ok)));

        assert!(tree.home().join(".config/hypr/hyprland.conf").is_symlink());
        assert_eq!(fs::read_to_string(&existing).unwrap(), "mine");

        let statuses: Vec<(String, TaskStatus)> = log
            .task_entries()
            .into_iter()
            .map(|e| (e.name, e.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("stow: hypr".to_string(), TaskStatus::Ok),
                ("stow: gone".to_string(), TaskStatus::Skipped),
                ("stow: waybar".to_string(), TaskStatus::Conflicted),
            ]
        );

        let run_dir = only_entry(&tree.backups());
        assert!(run_dir.join("waybar.log").exists());
        assert_eq!(ctx.report().conflicted(), 1);
    }

    #[test]
    fn backup_only_changes_nothing() {
        let tree = Tree::new();
        tree.file("bash/.bashrc");
        tree.file("bash/.profile");
        fs::write(tree.home().join(".profile"), "mine").unwrap();

        let (ctx, log, _tmp, _guard) = context_with(
            tree.configure(vec![tree.package("bash")]),
            Arc::new(MockExecutor::with_responses(vec![])),
        );

        assert!(matches!(BackupOnly.run(&ctx), Ok(TaskResult::DryRun)));
        assert!(tree.home().join(".bashrc").symlink_metadata().is_err());
        assert_eq!(log.conflict_count(), 1);
        let run_dir = only_entry(&tree.backups());
        assert!(fs::read_to_string(run_dir.join("bash.log"))
            .unwrap()
            .contains(".profile"));
    }

    #[test]
    fn unstow_removes_created_links() {
        let tree = Tree::new();
        tree.file("bash/.bashrc");
        let (ctx, _log, _tmp, _guard) = context_with(
            tree.configure(vec![tree.package("bash")]),
            Arc::new(MockExecutor::with_responses(vec![])),
        );

        StowPackages.run(&ctx).unwrap();
        assert!(tree.home().join(".bashrc").is_symlink());
        UnstowPackages.run(&ctx).unwrap();
        assert!(tree.home().join(".bashrc").symlink_metadata().is_err());
        assert!(matches!(
            ctx.report().outcomes.first(),
            Some((name, PackageOutcome::Linked { created: 1, .. })) if name == "bash"
        ));
    }

    #[test]
    fn privilege_failure_aborts_remaining_packages() {
        let tree = Tree::new();
        tree.file("etc/pacman.conf");
        tree.file("bash/.bashrc");
        let mut etc = tree.package("etc");
        etc.privileged = true;
        etc.target = tree.dir.path().join("etc");

        let (ctx, log, _tmp, _guard) = context_with(
            tree.configure(vec![etc, tree.package("bash")]),
            Arc::new(MockExecutor::fail()),
        );

        let err = StowPackages.run(&ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::PrivilegeFailure { .. })
        ));
        assert!(tree.home().join(".bashrc").symlink_metadata().is_err());
        assert!(log.task_entries().is_empty());
    }

    #[test]
    fn privileged_packages_require_link_tools() {
        let tree = Tree::new();
        let mut etc = tree.package("etc");
        etc.privileged = true;
        let (ctx, _log, _tmp, _guard) = context_with(
            tree.configure(vec![etc]),
            Arc::new(MockExecutor::with_responses(vec![])),
        );
        assert_eq!(StowPackages.required_tools(&ctx), vec!["sudo", "ln"]);
        assert_eq!(UnstowPackages.required_tools(&ctx), vec!["sudo", "rm"]);
        assert!(BackupOnly.required_tools(&ctx).is_empty());
    }
}
