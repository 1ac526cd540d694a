use std::sync::Arc;

use anyhow::Result;

use super::{CommandSetup, run_tasks_to_completion};
use crate::cli::{Cli, LinkMode, Steps, VERSION};
use crate::exec::SystemExecutor;
use crate::logging::{Log, Logger};
use crate::tasks::{self, Context, Task};

/// The tasks for `steps`, in execution order.
#[must_use]
pub fn select_tasks(steps: Steps) -> Vec<Box<dyn Task>> {
    let mut selected: Vec<Box<dyn Task>> = Vec::new();
    if steps.packages {
        selected.push(Box::new(tasks::packages::InstallPackages));
    }
    match steps.link {
        Some(LinkMode::Stow) => selected.push(Box::new(tasks::stow::StowPackages)),
        Some(LinkMode::Backup) => selected.push(Box::new(tasks::stow::BackupOnly)),
        Some(LinkMode::Unstow) => selected.push(Box::new(tasks::stow::UnstowPackages)),
        None => {}
    }
    if steps.services {
        selected.push(Box::new(tasks::services::ConfigureServices));
    }
    selected
}

/// Run the steps selected on the command line.
///
/// # Errors
///
/// Returns an error if configuration loading fails, a required tool is
/// missing, privilege cannot be acquired, or any step fails.
pub fn run(cli: &Cli, log: &Arc<Logger>) -> Result<()> {
    log.info(&format!("dotstow {VERSION}"));

    let setup = CommandSetup::init(cli.root.as_deref(), log)?;
    let ctx = Context::new(
        Arc::new(setup.config),
        Arc::clone(log) as Arc<dyn Log>,
        setup.home,
        Arc::new(SystemExecutor),
    );

    let selected = select_tasks(cli.steps());
    let refs: Vec<&dyn Task> = selected.iter().map(AsRef::as_ref).collect();

    log.stage("Checking required tools");
    tasks::preflight(&refs, &ctx)?;

    run_tasks_to_completion(refs, &ctx, log)
}
