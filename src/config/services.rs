//! Auxiliary services (`conf/services.toml`).
use serde::Deserialize;

/// Which systemd instance manages the unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The system manager, driven through `sudo`.
    #[default]
    System,
    /// The per-user manager (`systemctl --user`).
    User,
}

/// What to do with the unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// `systemctl enable --now`, skipped when already enabled.
    #[default]
    Enable,
    /// `systemctl restart`, always performed.
    Restart,
}

/// A systemd unit to manage.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Service {
    /// Unit name, e.g. `"bluetooth.service"`.
    pub name: String,
    /// Manager scope (default: system).
    #[serde(default)]
    pub scope: Scope,
    /// Action (default: enable).
    #[serde(default)]
    pub action: Action,
}

/// Deserialized shape of `services.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServicesConfig {
    /// Services in configuration order.
    #[serde(rename = "service")]
    pub services: Vec<Service>,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::test_helpers::write_temp_toml;
    use crate::config::toml_loader::load_config;

    #[test]
    fn load_services_with_defaults() {
        let (_dir, path) = write_temp_toml(
            r#"[[service]]
name = "bluetooth.service"

[[service]]
name = "pipewire.service"
scope = "user"
action = "restart"
"#,
        );
        let cfg: ServicesConfig = load_config(&path).unwrap();
        assert_eq!(cfg.services.len(), 2);
        assert_eq!(cfg.services[0].scope, Scope::System);
        assert_eq!(cfg.services[0].action, Action::Enable);
        assert_eq!(cfg.services[1].scope, Scope::User);
        assert_eq!(cfg.services[1].action, Action::Restart);
    }

    #[test]
    fn service_requires_name() {
        let (_dir, path) = write_temp_toml("[[service]]\nscope = \"user\"\n");
        assert!(load_config::<ServicesConfig>(&path).is_err());
    }
}
