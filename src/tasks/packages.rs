use anyhow::Result;

use super::{Context, Task, TaskResult, TaskStats};
use crate::resources::ResourceState;
use crate::resources::package::{
    PackageManager, PackageResource, batch_install_packages, get_installed_packages,
};

/// Install the configured official and AUR packages.
///
/// Installed state is queried once with `pacman -Q`; only missing packages
/// are passed on, with one install command per package manager.
#[derive(Debug)]
pub struct InstallPackages;

impl Task for InstallPackages {
    fn name(&self) -> &'static str {
        "Install packages"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.packages.is_empty()
    }

    fn required_tools(&self, ctx: &Context) -> Vec<&'static str> {
        let packages = &ctx.config.packages;
        let mut tools = vec!["pacman"];
        if !packages.official.is_empty() {
            tools.push("sudo");
        }
        if !packages.aur.is_empty() {
            tools.push(packages.aur_helper.program());
        }
        tools
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let packages = &ctx.config.packages;
        let executor = ctx.executor.as_ref();
        let resources: Vec<PackageResource<'_>> = packages
            .official
            .iter()
            .map(|name| PackageResource::new(name.clone(), PackageManager::Pacman, executor))
            .chain(packages.aur.iter().map(|name| {
                PackageResource::new(
                    name.clone(),
                    PackageManager::Aur(packages.aur_helper),
                    executor,
                )
            }))
            .collect();

        ctx.log.debug(&format!(
            "batch-checking {} packages with a single query",
            resources.len()
        ));
        let installed = get_installed_packages(executor)?;

        let mut stats = TaskStats::new();
        let mut missing: Vec<&PackageResource<'_>> = Vec::new();
        for resource in &resources {
            if resource.state_from_installed(&installed) == ResourceState::Correct {
                ctx.log.debug(&format!("ok: {}", resource.description()));
                stats.already_ok += 1;
            } else {
                missing.push(resource);
            }
        }

        if missing.is_empty() {
            return Ok(stats.finish(ctx));
        }

        if missing.iter().any(|r| r.manager == PackageManager::Pacman) {
            ctx.sudo.acquire("packages")?;
        }

        let names: Vec<&str> = missing.iter().map(|r| r.name.as_str()).collect();
        ctx.log.info(&format!("installing: {}", names.join(" ")));
        batch_install_packages(&missing)?;
        stats.changed += u32::try_from(missing.len()).unwrap_or(u32::MAX);

        Ok(stats.finish(ctx))
    }
}
