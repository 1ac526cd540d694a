//! External command execution behind the [`Executor`] seam.
//!
//! Every collaborator the installer drives (`pacman`, the AUR helper,
//! `sudo`, `systemctl`) is invoked through an [`Executor`] so that tasks and
//! resources can be unit-tested without spawning processes.
use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::{Arc, OnceLock};

use crate::error::InstallError;

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process was not terminated by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over process execution.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command and return its output. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command, allowing failure (returns the result without bailing).
    ///
    /// # Errors
    ///
    /// Returns an error only if the process cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command with the terminal attached, so that interactive prompts
    /// (e.g. the `sudo` password) reach the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exits non-zero.
    fn run_interactive(&self, program: &str, args: &[&str]) -> Result<()>;

    /// Locate a program on `PATH`.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Production [`Executor`] that spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

/// Execute a command and return the result, bailing on non-zero exit.
fn execute_checked(mut cmd: Command, label: &str) -> Result<ExecResult> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to execute: {label}"))?;
    let result = ExecResult::from(output);
    if !result.success {
        bail!(
            "{label} failed (exit {}): {}",
            result.code.unwrap_or(-1),
            result.stderr.trim()
        );
    }
    Ok(result)
}

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        execute_checked(cmd, program)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;

        Ok(ExecResult::from(output))
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> Result<()> {
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("failed to execute: {program}"))?;
        if !status.success() {
            bail!("{program} failed (exit {})", status.code().unwrap_or(-1));
        }
        Ok(())
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

/// Lazily validated `sudo` credentials.
///
/// The first [`acquire`](Self::acquire) runs `sudo -v` with the terminal
/// attached; its result is reused for the rest of the run so the user is
/// prompted at most once.
#[derive(Debug)]
pub struct Sudo {
    executor: Arc<dyn Executor>,
    validated: OnceLock<Result<(), String>>,
}

impl Sudo {
    /// Wrap `executor`; nothing runs until the first acquisition.
    #[must_use]
    pub const fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            validated: OnceLock::new(),
        }
    }

    /// Validate credentials (once) and return the executor to run `sudo`
    /// commands through.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::PrivilegeFailure`] naming `step` if `sudo -v`
    /// failed.
    pub fn acquire(&self, step: &str) -> Result<&dyn Executor, InstallError> {
        let validated = self.validated.get_or_init(|| {
            self.executor
                .run_interactive("sudo", &["-v"])
                .map_err(|e| e.to_string())
        });
        match validated {
            Ok(()) => Ok(self.executor.as_ref()),
            Err(reason) => Err(InstallError::PrivilegeFailure {
                step: step.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}
