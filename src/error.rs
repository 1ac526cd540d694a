//! Domain-specific error types for the installer.
//!
//! Internal modules return typed errors (e.g., [`ConfigError`],
//! [`InstallError`]) while the binary converts them to [`anyhow::Error`] via
//! the standard `?` operator.
//!
//! # Error taxonomy
//!
//! ```text
//! InstallError
//! ├── MissingDependency  : fatal, aborts before any step runs
//! ├── MissingPackageDir  : warning, the package is skipped
//! ├── LinkConflict       : warning, the destination is logged and skipped
//! ├── PrivilegeFailure   : fatal, aborts the run
//! └── Config(ConfigError): fatal, unreadable or invalid configuration
//! ```
//!
//! Unknown command-line options are rejected by `clap` before any of these
//! can occur.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that arise from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("IO error reading config file {}: {source}", .path.display())]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A config file contains invalid TOML or unexpected fields.
    #[error("invalid TOML in {}: {message}", .path.display())]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// A stow package name is not a single plain directory name.
    #[error("invalid package name '{name}': must be a single directory name")]
    InvalidPackageName {
        /// The offending name.
        name: String,
    },

    /// A glob pattern in the ignore list is malformed.
    #[error("invalid ignore pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Parser diagnostic.
        message: String,
    },
}

/// Errors and warnings raised while installing.
#[derive(Error, Debug)]
pub enum InstallError {
    /// A required external tool is not on `PATH`.
    #[error("required tool '{tool}' not found (needed for {needed_for})")]
    MissingDependency {
        /// Program name that was looked up.
        tool: String,
        /// The step that requires it.
        needed_for: String,
    },

    /// A configured package has no source directory.
    #[error("package '{package}' has no directory at {}", .path.display())]
    MissingPackageDir {
        /// Package name.
        package: String,
        /// Expected source directory.
        path: PathBuf,
    },

    /// A planned destination is occupied by something other than the expected link.
    #[error("package '{package}' conflicts with existing {}", .path.display())]
    LinkConflict {
        /// Package name.
        package: String,
        /// Conflicting destination path.
        path: PathBuf,
    },

    /// Elevated privilege could not be acquired.
    #[error("could not acquire elevated privilege for {step}: {reason}")]
    PrivilegeFailure {
        /// The step that needed privilege.
        step: String,
        /// Why acquisition failed.
        reason: String,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl InstallError {
    /// Whether this condition aborts the whole run.
    ///
    /// Missing package directories and link conflicts are reported and the
    /// run continues; everything else stops immediately.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::MissingPackageDir { .. } | Self::LinkConflict { .. }
        )
    }
}
