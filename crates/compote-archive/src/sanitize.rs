use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve an archive entry path against `base`.
///
/// Absolute entries and entries whose `..` components climb out of `base`
/// are rejected. `strip` leading components are removed first.
pub fn sanitize_entry_path(entry: &Path, base: &Path, strip: usize) -> Result<PathBuf> {
    let relative = normalize_relative(entry).ok_or_else(|| Error::ZipSlip {
        entry: entry.to_path_buf(),
        resolved: base.join(entry),
    })?;

    let relative = if strip > 0 {
        strip_components(&relative, strip)?
    } else {
        relative
    };

    Ok(base.join(relative))
}

/// Check that a symlink placed at `link` pointing at `target` stays inside `base`.
pub fn sanitize_symlink_target(target: &Path, link: &Path, base: &Path) -> Result<PathBuf> {
    let escape = || Error::SymlinkEscape {
        target: target.to_path_buf(),
        resolved: link.parent().unwrap_or(base).join(target),
    };

    if target.is_absolute() {
        return Err(escape());
    }

    let link_dir = link
        .parent()
        .and_then(|p| p.strip_prefix(base).ok())
        .ok_or_else(escape)?;

    let joined = link_dir.join(target);
    let resolved = normalize_relative(&joined).ok_or_else(escape)?;

    // `..` after an extracted symlink is resolved on disk, not lexically
    let mut walked = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Normal(part) => {
                walked.push(part);
                if is_symlink(&base.join(&walked))? {
                    return Err(escape());
                }
            }
            Component::ParentDir => {
                walked.pop();
            }
            _ => {}
        }
    }

    Ok(base.join(resolved))
}

/// Reject `path` when it, or any directory between `base` and it, is a symlink on disk.
///
/// Writing through an extracted symlink would follow it, possibly outside `base`.
pub fn ensure_no_symlink_components(path: &Path, base: &Path) -> Result<()> {
    let relative = path.strip_prefix(base).map_err(|_| Error::ZipSlip {
        entry: path.to_path_buf(),
        resolved: path.to_path_buf(),
    })?;

    let mut current = base.to_path_buf();
    for component in relative.components() {
        current.push(component);
        match std::fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(Error::SymlinkTraversal { path: current });
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(())
}

fn is_symlink(path: &Path) -> Result<bool> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) => Ok(meta.file_type().is_symlink()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Collapse `.` and `..` without touching the filesystem.
///
/// Returns `None` for absolute paths and for paths that climb above their start.
fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(parts.iter().collect())
}

fn strip_components(path: &Path, count: usize) -> Result<PathBuf> {
    let components: Vec<_> = path.components().collect();
    if components.len() <= count {
        return Err(Error::NoComponentsRemaining {
            original: path.to_path_buf(),
            count,
        });
    }
    Ok(components[count..].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> &'static Path {
        if cfg!(windows) {
            Path::new("C:/opt/component")
        } else {
            Path::new("/opt/component")
        }
    }

    #[test]
    fn plain_entry_resolves_under_base() {
        let resolved = sanitize_entry_path(Path::new("src/main.c"), base(), 0).unwrap();
        assert_eq!(resolved, base().join("src/main.c"));
    }

    #[test]
    fn inner_parent_dirs_are_collapsed() {
        let resolved = sanitize_entry_path(Path::new("a/./b/../c.h"), base(), 0).unwrap();
        assert_eq!(resolved, base().join("a/c.h"));
    }

    #[test]
    fn escaping_entry_is_rejected() {
        let result = sanitize_entry_path(Path::new("../../etc/passwd"), base(), 0);
        assert!(matches!(result, Err(Error::ZipSlip { .. })));
    }

    #[test]
    fn absolute_entry_is_rejected() {
        let malicious = if cfg!(windows) { "C:\\etc\\passwd" } else { "/etc/passwd" };
        let result = sanitize_entry_path(Path::new(malicious), base(), 0);
        assert!(matches!(result, Err(Error::ZipSlip { .. })));
    }

    #[test]
    fn strip_removes_leading_directory() {
        let resolved = sanitize_entry_path(Path::new("foo-1.0/include/foo.h"), base(), 1).unwrap();
        assert_eq!(resolved, base().join("include/foo.h"));
    }

    #[test]
    fn strip_everything_is_an_error() {
        let result = sanitize_entry_path(Path::new("foo-1.0"), base(), 1);
        assert!(matches!(result, Err(Error::NoComponentsRemaining { count: 1, .. })));
    }

    #[test]
    fn symlink_inside_base_is_allowed() {
        let link = base().join("lib/current");
        let resolved = sanitize_symlink_target(Path::new("../include"), &link, base()).unwrap();
        assert_eq!(resolved, base().join("include"));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_target_through_existing_link_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(".", dir.path().join("a")).unwrap();

        let result = sanitize_symlink_target(Path::new("a/.."), &dir.path().join("b"), dir.path());
        assert!(matches!(result, Err(Error::SymlinkEscape { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn writes_below_existing_link_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink("real", dir.path().join("alias")).unwrap();

        ensure_no_symlink_components(&dir.path().join("real/file.txt"), dir.path()).unwrap();
        ensure_no_symlink_components(&dir.path().join("new/dir/file.txt"), dir.path()).unwrap();

        let result = ensure_no_symlink_components(&dir.path().join("alias/file.txt"), dir.path());
        assert!(matches!(result, Err(Error::SymlinkTraversal { .. })));

        let result = ensure_no_symlink_components(&dir.path().join("alias"), dir.path());
        assert!(matches!(result, Err(Error::SymlinkTraversal { .. })));
    }

    #[test]
    fn symlink_escaping_base_is_rejected() {
        let link = base().join("lib/current");
        let result = sanitize_symlink_target(Path::new("../../secret"), &link, base());
        assert!(matches!(result, Err(Error::SymlinkEscape { .. })));
    }
}
