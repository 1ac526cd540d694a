//! Command orchestration: root discovery, configuration loading and the
//! sequential step runner.
pub mod install;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::config::Config;
use crate::error::InstallError;
use crate::logging::Logger;
use crate::tasks::{self, Context, Task};

/// Environment variable naming the dotfiles root.
pub const ROOT_ENV: &str = "DOTSTOW_ROOT";

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Resolved dotfiles root.
    pub root: PathBuf,
    /// User's home directory.
    pub home: PathBuf,
    /// Loaded configuration.
    pub config: Config,
}

impl CommandSetup {
    /// Resolve the root and home directories and load all configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be determined, `HOME`
    /// is unset, or any configuration file fails to load.
    pub fn init(root: Option<&Path>, log: &Logger) -> Result<Self> {
        let root = resolve_root(root)?;
        let home = tasks::home_dir()?;

        log.stage("Loading configuration");
        log.debug(&format!("root: {}", root.display()));
        let config = Config::load(&root, &home).map_err(InstallError::from)?;

        log.debug(&format!(
            "{} official packages",
            config.packages.official.len()
        ));
        log.debug(&format!("{} AUR packages", config.packages.aur.len()));
        log.debug(&format!(
            "backup directory: {}",
            config.stow.backup_dir.display()
        ));
        log.info(&format!(
            "loaded {} packages, {} stow packages, {} services",
            config.packages.official.len() + config.packages.aur.len(),
            config.stow.packages.len(),
            config.services.services.len()
        ));

        let warnings = config.validate(&home);
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!(
                    "  {} [{}]: {}",
                    warning.source, warning.item, warning.message
                ));
            }
        }

        Ok(Self { root, home, config })
    }
}

/// Resolve the dotfiles root directory.
///
/// In order: the explicit `--root`, `$DOTSTOW_ROOT`, the repository
/// containing the binary, then the current directory. Discovered (not
/// explicit) candidates must contain a `conf/` directory.
///
/// # Errors
///
/// Returns an error if an explicit root does not exist or no candidate
/// qualifies.
pub fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let given = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(ROOT_ENV).map(PathBuf::from));
    if let Some(root) = given {
        return dunce::canonicalize(&root)
            .with_context(|| format!("dotfiles root {} does not exist", root.display()));
    }

    let mut candidates = Vec::new();
    if let Ok(exe) = std::env::current_exe()
        && let Some(parent) = exe.parent()
    {
        candidates.push(parent.join("../..")); // target/release/ → repo root
        candidates.push(parent.join("..")); // bin/ → repo root
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd);
    }

    first_root(candidates).ok_or_else(|| {
        anyhow::anyhow!("cannot determine dotfiles root. Use --root or set {ROOT_ENV}")
    })
}

/// The first candidate that contains a `conf/` directory, canonicalized.
fn first_root(candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    candidates
        .into_iter()
        .filter(|c| c.join("conf").is_dir())
        .find_map(|c| dunce::canonicalize(c).ok())
}

/// Execute every task in order, print the summary, and bail if any task failed.
///
/// A fatal task error stops the run after printing the summary so far.
///
/// # Errors
///
/// Returns the fatal error, or an error if one or more tasks recorded a
/// failure.
pub fn run_tasks_to_completion<'a>(
    tasks: impl IntoIterator<Item = &'a dyn Task>,
    ctx: &Context,
    log: &Logger,
) -> Result<()> {
    for task in tasks {
        if let Err(e) = tasks::execute(task, ctx) {
            log.print_summary();
            return Err(e);
        }
    }

    log.print_summary();

    let conflicts = log.conflict_count();
    if conflicts > 0 {
        log.warn(&format!(
            "{conflicts} package(s) left with conflicts; existing files were not touched"
        ));
    }

    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} task(s) failed");
    }
    Ok(())
}
