//! Immutable installer configuration loaded from `<root>/conf/`.
pub mod packages;
pub mod services;
pub mod stow;
pub mod toml_loader;
pub mod validation;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use validation::{ConfigValidator as _, ValidationWarning};

/// All loaded configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dotfiles root; package sources live directly beneath it.
    pub root: PathBuf,
    /// Packages to install.
    pub packages: packages::PackagesConfig,
    /// Packages to link and where backups go.
    pub stow: stow::StowConfig,
    /// Services to enable or restart.
    pub services: services::ServicesConfig,
}

impl Config {
    /// Load every file under `<root>/conf/`. Missing files yield empty sections.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or parsed, or an ignore
    /// pattern is malformed.
    pub fn load(root: &Path, home: &Path) -> Result<Self, ConfigError> {
        let conf = root.join("conf");

        let packages = toml_loader::load_config(&conf.join("packages.toml"))?;
        let stow_file = toml_loader::load_config(&conf.join("stow.toml"))?;
        let stow = stow::StowConfig::resolve(stow_file, root, home)?;
        let services = toml_loader::load_config(&conf.join("services.toml"))?;

        Ok(Self {
            root: root.to_path_buf(),
            packages,
            stow,
            services,
        })
    }

    /// An empty configuration rooted at `root`.
    #[must_use]
    pub fn empty(root: &Path, home: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            packages: packages::PackagesConfig::default(),
            stow: stow::StowConfig::empty(&stow::expand_home(stow::DEFAULT_BACKUP_DIR, home)),
            services: services::ServicesConfig::default(),
        }
    }

    /// Run every section's validator.
    #[must_use]
    pub fn validate(&self, home: &Path) -> Vec<ValidationWarning> {
        let mut warnings = self.packages.validate(home);
        warnings.extend(self.stow.validate(home));
        warnings.extend(self.services.validate(home));
        warnings
    }
}
