//! Conflict detection: planned destinations already occupied by something else.
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use super::plan::LinkPlan;
use crate::resources::helpers::fs::{link_destination, points_to};

/// What occupies a conflicting destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// A regular file.
    File,
    /// A real directory.
    Directory,
    /// A symlink that leads somewhere other than the planned source.
    ForeignSymlink {
        /// Where the link leads.
        points_to: PathBuf,
    },
    /// A path component above the destination exists but is not a directory.
    BlockedAncestor {
        /// The blocking component.
        ancestor: PathBuf,
    },
    /// A path component above the destination is a symlink to a directory
    /// outside the package, so linking would write into someone else's tree.
    LinkedAncestor {
        /// The linked component.
        ancestor: PathBuf,
        /// Where it leads.
        points_to: PathBuf,
    },
    /// The destination could not be inspected.
    Unreadable {
        /// The I/O error.
        reason: String,
    },
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "existing file"),
            Self::Directory => write!(f, "existing directory"),
            Self::ForeignSymlink { points_to } => {
                write!(f, "symlink to {}", points_to.display())
            }
            Self::BlockedAncestor { ancestor } => {
                write!(f, "blocked by non-directory {}", ancestor.display())
            }
            Self::LinkedAncestor {
                ancestor,
                points_to,
            } => write!(
                f,
                "parent {} links to {}",
                ancestor.display(),
                points_to.display()
            ),
            Self::Unreadable { reason } => write!(f, "unreadable: {reason}"),
        }
    }
}

/// A planned destination that cannot be linked without touching existing data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// The occupied destination.
    pub destination: PathBuf,
    /// What occupies it.
    pub kind: ConflictKind,
}

/// Check every destination in `plan` and return those occupied by anything
/// other than the expected link, in plan order. Read-only.
#[must_use]
pub fn detect_conflicts(plan: &LinkPlan) -> Vec<Conflict> {
    plan.entries
        .iter()
        .filter_map(|entry| {
            classify(entry.destination.as_path(), entry.source.as_path(), plan).map(|kind| Conflict {
                destination: entry.destination.clone(),
                kind,
            })
        })
        .collect()
}

/// Classify a single destination; `None` means it is free or already linked.
fn classify(destination: &Path, source: &Path, plan: &LinkPlan) -> Option<ConflictKind> {
    if points_to(destination, source) {
        return None;
    }
    match std::fs::symlink_metadata(destination) {
        Ok(meta) if meta.is_symlink() => Some(ConflictKind::ForeignSymlink {
            points_to: link_destination(destination).unwrap_or_default(),
        }),
        Ok(meta) if meta.is_dir() => Some(ConflictKind::Directory),
        Ok(_) => Some(ConflictKind::File),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            blocking_ancestor(destination, &plan.target_root, &plan.source_root)
        }
        Err(e) => Some(ConflictKind::Unreadable {
            reason: e.to_string(),
        }),
    }
}

/// The highest existing component between `target_root` and `destination`
/// that cannot be traversed as a directory, or that is a symlink leading
/// outside `source_root`.
fn blocking_ancestor(
    destination: &Path,
    target_root: &Path,
    source_root: &Path,
) -> Option<ConflictKind> {
    let mut ancestors: Vec<&Path> = destination
        .ancestors()
        .skip(1)
        .take_while(|a| a.starts_with(target_root) && *a != target_root)
        .collect();
    ancestors.reverse();
    for ancestor in ancestors {
        let Ok(meta) = std::fs::symlink_metadata(ancestor) else {
            return None;
        };
        // `is_dir` follows links, so a dangling link is blocking too.
        if !ancestor.is_dir() {
            return Some(ConflictKind::BlockedAncestor {
                ancestor: ancestor.to_path_buf(),
            });
        }
        if meta.is_symlink() {
            let dest = link_destination(ancestor).unwrap_or_default();
            if !dest.starts_with(source_root) {
                return Some(ConflictKind::LinkedAncestor {
                    ancestor: ancestor.to_path_buf(),
                    points_to: dest,
                });
            }
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::stow::IgnoreSet;
    use crate::link::plan::plan_links;
    use std::fs;
    use std::os::unix::fs::symlink;

    struct Fixture {
        dir: tempfile::TempDir,
        src: PathBuf,
        home: PathBuf,
    }

    fn fixture(files: &[&str]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("dots/pkg");
        for f in files {
            let p = src.join(f);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(p, "pkg").unwrap();
        }
        let home = dir.path().join("home");
        fs::create_dir_all(&home).unwrap();
        Fixture {
            dir,
            src,
            home,
        }
    }

    fn plan(fx: &Fixture) -> LinkPlan {
        plan_links("pkg", &fx.src, &fx.home, &IgnoreSet::default()).unwrap()
    }

    #[test]
    fn empty_target_has_no_conflicts() {
        let fx = fixture(&[".bashrc", ".config/waybar/config"]);
        assert!(detect_conflicts(&plan(&fx)).is_empty());
    }

    #[test]
    fn regular_file_conflicts() {
        let fx = fixture(&[".config/waybar/config"]);
        let existing = fx.home.join(".config/waybar/config");
        fs::create_dir_all(existing.parent().unwrap()).unwrap();
        fs::write(&existing, "user").unwrap();

        let conflicts = detect_conflicts(&plan(&fx));
        assert_eq!(
            conflicts,
            vec![Conflict {
                destination: existing.clone(),
                kind: ConflictKind::File,
            }]
        );
        assert_eq!(fs::read_to_string(existing).unwrap(), "user");
    }

    #[test]
    fn directory_conflicts() {
        let fx = fixture(&[".vimrc"]);
        fs::create_dir(fx.home.join(".vimrc")).unwrap();
        let conflicts = detect_conflicts(&plan(&fx));
        assert_eq!(conflicts[0].kind, ConflictKind::Directory);
    }

    #[test]
    fn foreign_symlink_conflicts() {
        let fx = fixture(&[".bashrc"]);
        symlink("/etc/skel/.bashrc", fx.home.join(".bashrc")).unwrap();
        let conflicts = detect_conflicts(&plan(&fx));
        assert_eq!(
            conflicts[0].kind,
            ConflictKind::ForeignSymlink {
                points_to: PathBuf::from("/etc/skel/.bashrc")
            }
        );
    }

    #[test]
    fn expected_links_are_not_conflicts() {
        let fx = fixture(&[".bashrc", ".profile"]);
        symlink(fx.src.join(".bashrc"), fx.home.join(".bashrc")).unwrap();
        symlink("../dots/pkg/.profile", fx.home.join(".profile")).unwrap();
        assert!(detect_conflicts(&plan(&fx)).is_empty());
    }

    #[test]
    fn folded_parent_is_not_a_conflict() {
        let fx = fixture(&[".config/nvim/init.lua"]);
        fs::create_dir_all(fx.home.join(".config")).unwrap();
        symlink(fx.src.join(".config/nvim"), fx.home.join(".config/nvim")).unwrap();
        assert!(detect_conflicts(&plan(&fx)).is_empty());
    }

    #[test]
    fn parent_linked_outside_package_conflicts() {
        let fx = fixture(&[".config/nvim/init.lua"]);
        let foreign = fx.dir.path().join("other-dotfiles/nvim");
        fs::create_dir_all(&foreign).unwrap();
        fs::create_dir_all(fx.home.join(".config")).unwrap();
        symlink(&foreign, fx.home.join(".config/nvim")).unwrap();

        let plan = plan(&fx);
        let conflicts = detect_conflicts(&plan);

        assert_eq!(
            conflicts,
            vec![Conflict {
                destination: fx.home.join(".config/nvim/init.lua"),
                kind: ConflictKind::LinkedAncestor {
                    ancestor: fx.home.join(".config/nvim"),
                    points_to: foreign.clone(),
                },
            }]
        );
        let stats = crate::link::apply::apply(&plan, &conflicts, None).unwrap();
        assert_eq!(stats.created, 0);
        assert!(foreign.join("init.lua").symlink_metadata().is_err());
    }

    #[test]
    fn file_in_place_of_parent_blocks() {
        let fx = fixture(&[".config/hypr/hyprland.conf"]);
        fs::write(fx.home.join(".config"), "oops").unwrap();
        let conflicts = detect_conflicts(&plan(&fx));
        assert_eq!(
            conflicts[0].kind,
            ConflictKind::BlockedAncestor {
                ancestor: fx.home.join(".config")
            }
        );
    }

    #[test]
    fn dangling_parent_link_blocks() {
        let fx = fixture(&[".local/bin/tool"]);
        symlink("/nonexistent/dir", fx.home.join(".local")).unwrap();
        let conflicts = detect_conflicts(&plan(&fx));
        assert_eq!(conflicts.len(), 1);
        assert!(matches!(
            conflicts[0].kind,
            ConflictKind::BlockedAncestor { .. }
        ));
    }

    #[test]
    fn kind_display() {
        assert_eq!(ConflictKind::File.to_string(), "existing file");
        assert_eq!(
            ConflictKind::ForeignSymlink {
                points_to: PathBuf::from("/x")
            }
            .to_string(),
            "symlink to /x"
        );
        assert_eq!(
            ConflictKind::LinkedAncestor {
                ancestor: PathBuf::from("/h/.config"),
                points_to: PathBuf::from("/srv/cfg"),
            }
            .to_string(),
            "parent /h/.config links to /srv/cfg"
        );
    }
}
