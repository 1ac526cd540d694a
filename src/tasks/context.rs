use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;

use crate::config::Config;
use crate::exec::{Executor, Sudo};
use crate::link::RunReport;
use crate::logging::Log;

/// Shared context for task execution.
pub struct Context {
    /// Configuration loaded once at startup.
    pub config: Arc<Config>,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// User's home directory path.
    pub home: PathBuf,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Privilege escalation, validated at most once per run.
    pub sudo: Sudo,
    report: Mutex<RunReport>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &"<Config>")
            .field("log", &"<dyn Log>")
            .field("home", &self.home)
            .field("executor", &self.executor)
            .field("sudo", &self.sudo)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Creates a new context for task execution.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        log: Arc<dyn Log>,
        home: PathBuf,
        executor: Arc<dyn Executor>,
    ) -> Self {
        let sudo = Sudo::new(Arc::clone(&executor));
        Self {
            config,
            log,
            home,
            executor,
            sudo,
            report: Mutex::new(RunReport::default()),
        }
    }

    /// Package outcomes recorded so far.
    ///
    /// Recovers from a poisoned lock by consuming the poison and returning
    /// the inner value.
    pub fn report(&self) -> MutexGuard<'_, RunReport> {
        self.report.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolve the user's home directory from `HOME`.
///
/// # Errors
///
/// Returns an error if `HOME` is not set.
pub fn home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("HOME environment variable is not set"))
}
