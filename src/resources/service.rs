//! Systemd service resource.
use anyhow::Result;

use super::{Applicable, Resource, ResourceChange, ResourceState};
use crate::config::services::{Action, Scope, Service};
use crate::exec::{ExecResult, Executor};

/// A systemd unit to enable or restart.
#[derive(Debug)]
pub struct ServiceResource<'a> {
    /// Unit name (e.g. "bluetooth.service").
    pub name: String,
    /// Which manager owns the unit.
    pub scope: Scope,
    /// What to do with it.
    pub action: Action,
    executor: &'a dyn Executor,
}

impl<'a> ServiceResource<'a> {
    /// Create from a config entry.
    #[must_use]
    pub fn from_entry(entry: &Service, executor: &'a dyn Executor) -> Self {
        Self {
            name: entry.name.clone(),
            scope: entry.scope,
            action: entry.action,
            executor,
        }
    }

    /// Run `systemctl <args…> <unit>` in this unit's scope.
    ///
    /// System-scope mutations go through `sudo`; queries never do.
    fn systemctl(&self, args: &[&str], mutate: bool) -> Result<ExecResult> {
        let (program, mut full): (&str, Vec<&str>) = match self.scope {
            Scope::User => ("systemctl", vec!["--user"]),
            Scope::System if mutate => ("sudo", vec!["systemctl"]),
            Scope::System => ("systemctl", Vec::new()),
        };
        full.extend(args);
        full.push(&self.name);
        self.executor.run_unchecked(program, &full)
    }
}

impl Applicable for ServiceResource<'_> {
    fn description(&self) -> String {
        let scope = match self.scope {
            Scope::System => "system",
            Scope::User => "user",
        };
        format!("{} ({scope})", self.name)
    }

    fn apply(&self) -> Result<ResourceChange> {
        let args: &[&str] = match self.action {
            Action::Enable => &["enable", "--now"],
            Action::Restart => &["restart"],
        };
        let result = self.systemctl(args, true)?;
        if result.success {
            Ok(ResourceChange::Applied)
        } else {
            let stderr = result.stderr.trim();
            let reason = match result.code {
                _ if !stderr.is_empty() => stderr.to_string(),
                Some(code) => format!("exit {code}"),
                None => "terminated by signal".to_string(),
            };
            Ok(ResourceChange::Skipped { reason })
        }
    }
}

impl Resource for ServiceResource<'_> {
    fn current_state(&self) -> Result<ResourceState> {
        match self.action {
            // A restart is requested every run.
            Action::Restart => Ok(ResourceState::Missing),
            Action::Enable => {
                let result = self.systemctl(&["is-enabled", "--quiet"], false)?;
                if result.success {
                    Ok(ResourceState::Correct)
                } else {
                    Ok(ResourceState::Missing)
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    fn service(scope: Scope, action: Action) -> Service {
        Service {
            name: "bluetooth.service".to_string(),
            scope,
            action,
        }
    }

    #[test]
    fn description_names_scope() {
        let executor = MockExecutor::ok("");
        let entry = service(Scope::User, Action::Enable);
        let resource = ServiceResource::from_entry(&entry, &executor);
        assert_eq!(resource.description(), "bluetooth.service (user)");
    }

    #[test]
    fn enabled_system_unit_is_correct_without_sudo() {
        let executor = MockExecutor::ok("");
        let entry = service(Scope::System, Action::Enable);
        let resource = ServiceResource::from_entry(&entry, &executor);
        assert_eq!(resource.current_state().unwrap(), ResourceState::Correct);
        assert_eq!(
            executor.calls(),
            vec!["systemctl is-enabled --quiet bluetooth.service"]
        );
    }

    #[test]
    fn enable_system_unit_uses_sudo() {
        let executor = MockExecutor::ok("");
        let entry = service(Scope::System, Action::Enable);
        let resource = ServiceResource::from_entry(&entry, &executor);
        assert_eq!(resource.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(
            executor.calls(),
            vec!["sudo systemctl enable --now bluetooth.service"]
        );
    }

    #[test]
    fn restart_user_unit() {
        let executor = MockExecutor::ok("");
        let entry = service(Scope::User, Action::Restart);
        let resource = ServiceResource::from_entry(&entry, &executor);
        assert_eq!(resource.current_state().unwrap(), ResourceState::Missing);
        assert_eq!(executor.call_count(), 0, "restart needs no state query");
        assert_eq!(resource.apply().unwrap(), ResourceChange::Applied);
        assert_eq!(
            executor.calls(),
            vec!["systemctl --user restart bluetooth.service"]
        );
    }

    #[test]
    fn failed_enable_reports_exit_code() {
        let executor = MockExecutor::fail();
        let entry = service(Scope::User, Action::Enable);
        let resource = ServiceResource::from_entry(&entry, &executor);
        assert!(matches!(
            resource.apply().unwrap(),
            ResourceChange::Skipped { reason } if reason == "exit 1"
        ));
    }
}
