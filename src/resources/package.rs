//! Package installation resource.
use std::collections::HashSet;

use anyhow::Result;

use super::ResourceState;
use crate::config::packages::AurHelper;
use crate::exec::Executor;

/// Package managers that can install a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// Official repositories, through `sudo pacman`.
    Pacman,
    /// The AUR, through a helper run as the invoking user.
    Aur(AurHelper),
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pacman => write!(f, "pacman"),
            Self::Aur(helper) => write!(f, "{}", helper.program()),
        }
    }
}

impl PackageManager {
    /// Program and leading arguments of the install command.
    const fn install_prefix(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Pacman => ("sudo", &["pacman", "-S", "--needed", "--noconfirm"]),
            Self::Aur(helper) => (helper.program(), &["-S", "--needed", "--noconfirm"]),
        }
    }
}

/// A system package resource that can be checked and installed.
#[derive(Debug)]
pub struct PackageResource<'a> {
    /// Package name.
    pub name: String,
    /// Package manager to use.
    pub manager: PackageManager,
    executor: &'a dyn Executor,
}

impl<'a> PackageResource<'a> {
    /// Create a new package resource.
    #[must_use]
    pub const fn new(name: String, manager: PackageManager, executor: &'a dyn Executor) -> Self {
        Self {
            name,
            manager,
            executor,
        }
    }

    /// Human-readable description, e.g. `"hyprshot (paru)"`.
    #[must_use]
    pub fn description(&self) -> String {
        format!("{} ({})", self.name, self.manager)
    }

    /// Determine the resource state from a pre-fetched set of installed package names.
    #[must_use]
    pub fn state_from_installed(&self, installed: &HashSet<String>) -> ResourceState {
        if installed.contains(&self.name) {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        }
    }
}

/// Query the full set of installed package names with a single `pacman -Q`.
///
/// AUR packages are registered with pacman too, so one query covers both
/// managers. A failing query yields an empty set.
///
/// # Errors
///
/// Returns an error if `pacman` cannot be spawned.
pub fn get_installed_packages(executor: &dyn Executor) -> Result<HashSet<String>> {
    // One line per package: "name version"
    let result = executor.run_unchecked("pacman", &["-Q"])?;
    let mut set = HashSet::new();
    if result.success {
        for line in result.stdout.lines() {
            if let Some(name) = line.split_whitespace().next() {
                set.insert(name.to_string());
            }
        }
    }
    Ok(set)
}

/// Install a batch of packages with one command per package manager.
///
/// Commands run with the terminal attached so `sudo` can prompt and the
/// package manager can show progress.
///
/// # Errors
///
/// Returns an error if any install command fails.
pub fn batch_install_packages(resources: &[&PackageResource<'_>]) -> Result<()> {
    let mut managers: Vec<PackageManager> = Vec::new();
    for r in resources {
        if !managers.contains(&r.manager) {
            managers.push(r.manager);
        }
    }

    for manager in managers {
        let group: Vec<&&PackageResource<'_>> =
            resources.iter().filter(|r| r.manager == manager).collect();
        let Some(first) = group.first() else {
            continue;
        };
        let (program, prefix) = manager.install_prefix();
        let mut args: Vec<&str> = prefix.to_vec();
        args.extend(group.iter().map(|r| r.name.as_str()));
        first.executor.run_interactive(program, &args)?;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    #[test]
    fn description_includes_manager() {
        let executor = MockExecutor::ok("");
        let resource = PackageResource::new(
            "hyprshot".to_string(),
            PackageManager::Aur(AurHelper::Yay),
            &executor,
        );
        assert_eq!(resource.description(), "hyprshot (yay)");
    }

    #[test]
    fn installed_set_parses_pacman_output() {
        let executor = MockExecutor::ok("git 2.45.0-1\nstow 2.4.0-1\n");
        let installed = get_installed_packages(&executor).unwrap();
        assert_eq!(installed.len(), 2);
        assert!(installed.contains("git"));
        assert_eq!(executor.calls(), vec!["pacman -Q"]);
    }

    #[test]
    fn installed_set_empty_on_failure() {
        let executor = MockExecutor::fail();
        assert!(get_installed_packages(&executor).unwrap().is_empty());
    }

    #[test]
    fn state_from_installed() {
        let executor = MockExecutor::ok("");
        let resource = PackageResource::new("git".to_string(), PackageManager::Pacman, &executor);
        let installed: HashSet<String> = ["git".to_string()].into();
        assert_eq!(
            resource.state_from_installed(&installed),
            ResourceState::Correct
        );
        assert_eq!(
            resource.state_from_installed(&HashSet::new()),
            ResourceState::Missing
        );
    }

    #[test]
    fn batch_install_one_command_per_manager() {
        let executor = MockExecutor::with_responses(vec![(true, String::new()), (true, String::new())]);
        let git = PackageResource::new("git".to_string(), PackageManager::Pacman, &executor);
        let stow = PackageResource::new("stow".to_string(), PackageManager::Pacman, &executor);
        let shot = PackageResource::new(
            "hyprshot".to_string(),
            PackageManager::Aur(AurHelper::Paru),
            &executor,
        );
        batch_install_packages(&[&git, &shot, &stow]).unwrap();
        assert_eq!(
            executor.calls(),
            vec![
                "sudo pacman -S --needed --noconfirm git stow",
                "paru -S --needed --noconfirm hyprshot",
            ]
        );
    }

    #[test]
    fn batch_install_propagates_failure() {
        let executor = MockExecutor::fail();
        let git = PackageResource::new("git".to_string(), PackageManager::Pacman, &executor);
        assert!(batch_install_packages(&[&git]).is_err());
    }
}
