//! Non-fatal configuration checks.
use std::collections::HashSet;
use std::path::Path;

use super::packages::PackagesConfig;
use super::services::ServicesConfig;
use super::stow::StowConfig;

/// A validation warning detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The configuration source (e.g., "stow.toml").
    pub source: String,
    /// The specific item that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Configuration sections that can check themselves.
pub trait ConfigValidator {
    /// Validate the section and return any warnings found.
    fn validate(&self, home: &Path) -> Vec<ValidationWarning>;
}

/// Report names that are empty or appear more than once.
fn check_names<'a>(
    source: &str,
    kind: &str,
    names: impl Iterator<Item = &'a str>,
    warnings: &mut Vec<ValidationWarning>,
) {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            warnings.push(ValidationWarning::new(
                source,
                name,
                format!("{kind} name is empty"),
            ));
        } else if !seen.insert(name) {
            warnings.push(ValidationWarning::new(
                source,
                name,
                format!("duplicate {kind} name"),
            ));
        }
    }
}

impl ConfigValidator for StowConfig {
    fn validate(&self, home: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        check_names(
            "stow.toml",
            "package",
            self.packages.iter().map(|p| p.name.as_str()),
            &mut warnings,
        );

        for package in &self.packages {
            if let Some(raw) = &package.raw_target
                && !raw.starts_with('~')
                && !Path::new(raw).is_absolute()
            {
                warnings.push(ValidationWarning::new(
                    "stow.toml",
                    &package.name,
                    format!(
                        "target '{raw}' is relative; resolved to {}",
                        package.target.display()
                    ),
                ));
            }
            if package.privileged && package.target.starts_with(home) {
                warnings.push(ValidationWarning::new(
                    "stow.toml",
                    &package.name,
                    "privileged package targets the home directory; links will be owned by root",
                ));
            }
        }

        warnings
    }
}

impl ConfigValidator for PackagesConfig {
    fn validate(&self, _home: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        check_names(
            "packages.toml",
            "package",
            self.official.iter().chain(&self.aur).map(String::as_str),
            &mut warnings,
        );
        warnings
    }
}

impl ConfigValidator for ServicesConfig {
    fn validate(&self, _home: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        check_names(
            "services.toml",
            "service",
            self.services.iter().map(|s| s.name.as_str()),
            &mut warnings,
        );
        warnings
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::services::Service;
    use crate::config::stow::StowPackage;
    use std::path::PathBuf;

    fn package(name: &str, target: &str, privileged: bool) -> StowPackage {
        let mut p = StowPackage::new(name, Path::new("/dots"), Path::new(target), privileged);
        p.raw_target = Some(target.to_string());
        p
    }

    fn stow(packages: Vec<StowPackage>) -> StowConfig {
        let mut cfg = StowConfig::empty(Path::new("/home/u/.dotfiles-backup"));
        cfg.packages = packages;
        cfg
    }

    #[test]
    fn clean_stow_config_has_no_warnings() {
        let cfg = stow(vec![
            package("hypr", "/home/u", false),
            package("etc", "/etc", true),
        ]);
        assert!(cfg.validate(Path::new("/home/u")).is_empty());
    }

    #[test]
    fn duplicate_and_empty_package_names() {
        let cfg = stow(vec![
            package("hypr", "/home/u", false),
            package("hypr", "/home/u", false),
            package(" ", "/home/u", false),
        ]);
        let warnings = cfg.validate(Path::new("/home/u"));
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].message.contains("duplicate"));
        assert!(warnings[1].message.contains("empty"));
    }

    #[test]
    fn relative_target_warns() {
        let mut p = package("x", "/home/u/rel", false);
        p.raw_target = Some("rel".to_string());
        let warnings = stow(vec![p]).validate(Path::new("/home/u"));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("relative"));
    }

    #[test]
    fn privileged_home_target_warns() {
        let warnings =
            stow(vec![package("root-home", "/home/u", true)]).validate(Path::new("/home/u"));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].item, "root-home");
    }

    #[test]
    fn duplicate_across_official_and_aur() {
        let cfg = PackagesConfig {
            official: vec!["git".to_string()],
            aur: vec!["git".to_string()],
            ..PackagesConfig::default()
        };
        let warnings = cfg.validate(&PathBuf::from("/home/u"));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].source, "packages.toml");
    }

    #[test]
    fn duplicate_services() {
        let svc = Service {
            name: "sshd.service".to_string(),
            scope: crate::config::services::Scope::System,
            action: crate::config::services::Action::Enable,
        };
        let cfg = ServicesConfig {
            services: vec![svc.clone(), svc],
        };
        assert_eq!(cfg.validate(Path::new("/home/u")).len(), 1);
    }
}
