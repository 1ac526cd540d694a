//! System package lists (`conf/packages.toml`).
use serde::Deserialize;

/// AUR helper used for packages outside the official repositories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AurHelper {
    /// `paru`
    #[default]
    Paru,
    /// `yay`
    Yay,
}

impl AurHelper {
    /// Program name on `PATH`.
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Paru => "paru",
            Self::Yay => "yay",
        }
    }
}

/// Packages to install.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackagesConfig {
    /// Packages from the official repositories, installed with `pacman`.
    pub official: Vec<String>,
    /// Packages from the AUR, installed with [`aur_helper`](Self::aur_helper).
    pub aur: Vec<String>,
    /// Which AUR helper to run.
    pub aur_helper: AurHelper,
}

impl PackagesConfig {
    /// Whether nothing is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.official.is_empty() && self.aur.is_empty()
    }
}
