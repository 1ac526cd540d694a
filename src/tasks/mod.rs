//! Named steps that orchestrate resource changes, run in a fixed order.
mod context;
pub mod packages;
mod processing;
pub mod services;
pub mod stow;

pub use context::{Context, home_dir};
pub use processing::{TaskResult, TaskStats, process_resources};

use anyhow::Result;

use crate::error::InstallError;
use crate::logging::TaskStatus;

/// A named, executable step.
pub trait Task {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// Whether this task has anything to do with the loaded configuration.
    fn should_run(&self, ctx: &Context) -> bool;

    /// External programs this task invokes, checked before any task runs.
    fn required_tools(&self, _ctx: &Context) -> Vec<&'static str> {
        Vec::new()
    }

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if the task fails, such as when a system command
    /// fails or privilege cannot be acquired.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// Whether `err` carries an [`InstallError`] that aborts the whole run.
pub(crate) fn is_fatal(err: &anyhow::Error) -> bool {
    err.downcast_ref::<InstallError>()
        .is_some_and(InstallError::is_fatal)
}

/// Verify that every program the selected tasks need is on `PATH`.
///
/// Runs before any task so a missing tool aborts without side effects.
///
/// # Errors
///
/// Returns [`InstallError::MissingDependency`] for the first missing tool.
pub fn preflight(tasks: &[&dyn Task], ctx: &Context) -> Result<(), InstallError> {
    for task in tasks.iter().filter(|t| t.should_run(ctx)) {
        for tool in task.required_tools(ctx) {
            match ctx.executor.locate(tool) {
                Some(path) => ctx.log.debug(&format!("found {tool}: {}", path.display())),
                None => {
                    return Err(InstallError::MissingDependency {
                        tool: tool.to_string(),
                        needed_for: task.name().to_lowercase(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Execute a task, recording the result in the logger.
///
/// Ordinary failures are recorded and the run continues.
///
/// # Errors
///
/// Returns the task's error when it is fatal (see [`InstallError::is_fatal`]).
pub fn execute(task: &dyn Task, ctx: &Context) -> Result<()> {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (nothing configured)", task.name()));
        ctx.log.record_task(
            task.name(),
            TaskStatus::Skipped,
            Some("nothing configured"),
        );
        return Ok(());
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Ok) => {
            ctx.log.record_task(task.name(), TaskStatus::Ok, None);
        }
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.info(&format!("skipped: {reason}"));
            ctx.log
                .record_task(task.name(), TaskStatus::Skipped, Some(&reason));
        }
        Ok(TaskResult::DryRun) => {
            ctx.log.record_task(task.name(), TaskStatus::DryRun, None);
        }
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            ctx.log
                .record_task(task.name(), TaskStatus::Failed, Some(&format!("{e:#}")));
            if is_fatal(&e) {
                return Err(e);
            }
        }
    }
    Ok(())
}
