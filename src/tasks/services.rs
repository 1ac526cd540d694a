use anyhow::Result;

use super::{Context, Task, TaskResult, process_resources};
use crate::config::services::{Action, Scope};
use crate::resources::Resource as _;
use crate::resources::service::ServiceResource;

/// Enable or restart the configured systemd services.
#[derive(Debug)]
pub struct ConfigureServices;

impl Task for ConfigureServices {
    fn name(&self) -> &'static str {
        "Configure services"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.services.services.is_empty()
    }

    fn required_tools(&self, ctx: &Context) -> Vec<&'static str> {
        let mut tools = vec!["systemctl"];
        if ctx
            .config
            .services
            .services
            .iter()
            .any(|s| s.scope == Scope::System)
        {
            tools.push("sudo");
        }
        tools
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let resources: Vec<ServiceResource<'_>> = ctx
            .config
            .services
            .services
            .iter()
            .map(|s| ServiceResource::from_entry(s, ctx.executor.as_ref()))
            .collect();

        let mut privileged_work = false;
        for resource in resources.iter().filter(|r| r.scope == Scope::System) {
            if resource.needs_change()? {
                privileged_work = true;
                break;
            }
        }
        if privileged_work {
            ctx.sudo.acquire("services")?;
        }

        process_resources(ctx, resources, |r| match r.action {
            Action::Enable => "enable",
            Action::Restart => "restart",
        })
    }
}
