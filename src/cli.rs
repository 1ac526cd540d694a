use std::path::PathBuf;

use clap::Parser;

/// Version string: `DOTSTOW_VERSION` from the build, else the crate version.
pub const VERSION: &str = match option_env!("DOTSTOW_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// Top-level CLI entry point.
///
/// Step flags combine freely; steps always run in the order packages,
/// stow (or backup-only, or unstow), services.
#[derive(Parser, Debug)]
#[command(
    name = "dotstow",
    about = "Install packages, stow dotfiles without clobbering, and enable services",
    version = VERSION
)]
pub struct Cli {
    /// Install packages, stow dotfiles and configure services
    #[arg(long)]
    pub all: bool,

    /// Install official and AUR packages
    #[arg(long)]
    pub packages: bool,

    /// Link every configured package, logging conflicts instead of overwriting
    #[arg(long)]
    pub stow: bool,

    /// Enable or restart the configured services
    #[arg(long)]
    pub services: bool,

    /// Only detect conflicts and write backup logs; change nothing
    #[arg(long, conflicts_with_all = ["stow", "unstow"])]
    pub backup: bool,

    /// Remove links that point into package sources
    #[arg(long, conflicts_with_all = ["stow", "all"])]
    pub unstow: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Dotfiles root directory (default: $DOTSTOW_ROOT, the binary's repository, or the current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

/// What the link step does, if it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Detect conflicts, log them, link everything else.
    Stow,
    /// Detect and log conflicts only.
    Backup,
    /// Remove links into package sources.
    Unstow,
}

/// Steps selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Steps {
    /// Run the package step.
    pub packages: bool,
    /// Run the link step in this mode.
    pub link: Option<LinkMode>,
    /// Run the services step.
    pub services: bool,
}

impl Cli {
    /// Resolve the flags into the steps to run.
    ///
    /// `--backup` takes the place of stowing, including under `--all`.
    #[must_use]
    pub const fn steps(&self) -> Steps {
        let link = if self.unstow {
            Some(LinkMode::Unstow)
        } else if self.backup {
            Some(LinkMode::Backup)
        } else if self.stow || self.all {
            Some(LinkMode::Stow)
        } else {
            None
        };
        Steps {
            packages: self.packages || self.all,
            link,
            services: self.services || self.all,
        }
    }

    /// Whether any step was requested.
    #[must_use]
    pub const fn has_action(&self) -> bool {
        let steps = self.steps();
        steps.packages || steps.link.is_some() || steps.services
    }

    /// Name of this run's log file under the cache directory.
    #[must_use]
    pub const fn command_name(&self) -> &'static str {
        match self.steps().link {
            Some(LinkMode::Backup) => "backup",
            Some(LinkMode::Unstow) => "unstow",
            Some(LinkMode::Stow) | None => "install",
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_flags_means_no_action() {
        let cli = Cli::parse_from(["dotstow"]);
        assert!(!cli.has_action());
    }

    #[test]
    fn all_enables_first_three_steps() {
        let cli = Cli::parse_from(["dotstow", "--all"]);
        assert_eq!(
            cli.steps(),
            Steps {
                packages: true,
                link: Some(LinkMode::Stow),
                services: true
            }
        );
    }

    #[test]
    fn flags_are_independent() {
        let cli = Cli::parse_from(["dotstow", "--services"]);
        assert_eq!(
            cli.steps(),
            Steps {
                packages: false,
                link: None,
                services: true
            }
        );
    }

    #[test]
    fn backup_replaces_stow_under_all() {
        let cli = Cli::parse_from(["dotstow", "--all", "--backup"]);
        assert_eq!(cli.steps().link, Some(LinkMode::Backup));
        assert!(cli.steps().packages);
        assert_eq!(cli.command_name(), "backup");
    }

    #[test]
    fn backup_conflicts_with_stow() {
        assert!(Cli::try_parse_from(["dotstow", "--backup", "--stow"]).is_err());
    }

    #[test]
    fn unstow_conflicts_with_all() {
        assert!(Cli::try_parse_from(["dotstow", "--unstow", "--all"]).is_err());
        let cli = Cli::parse_from(["dotstow", "--unstow"]);
        assert_eq!(cli.steps().link, Some(LinkMode::Unstow));
    }

    #[test]
    fn unknown_flag_is_a_usage_error() {
        let err = Cli::try_parse_from(["dotstow", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn parse_root_override() {
        let cli = Cli::parse_from(["dotstow", "--root", "/tmp/dots", "--stow"]);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/dots")));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["dotstow", "-v", "--stow"]);
        assert!(cli.verbose);
    }
}
