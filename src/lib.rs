//! Conflict-aware dotfiles installer.
//!
//! Installs system packages, links ("stows") package directories into the
//! home directory and `/etc` without overwriting anything, and enables
//! services, all driven by TOML files in `conf/`.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: parse and validate the TOML config files
//! - **[`resources`]**: idempotent `check + apply` primitives (symlinks, packages, services)
//! - **[`link`]**: plan, conflict detection, backup logs and apply/unapply per package
//! - **[`tasks`]**: named steps wired to resources and the link installer
//! - **[`commands`]**: root discovery and the sequential step runner
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod link;
pub mod logging;
pub mod resources;
pub mod tasks;
