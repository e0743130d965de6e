//! Cross-platform path utilities
//!
//! Windows paths use backslashes (`\`) while jar entries and log messages use forward slashes (`/`).
//! Relative paths are also the keys shared between a source tree and its mirror, so they are
//! cleaned before use.

use std::path::{Component, Path, PathBuf};

/// Normalize path to forward slashes
#[inline]
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Convert PathBuf to normalized string
#[inline]
pub fn path_to_string(path: &Path) -> String {
    normalize_path(&path.to_string_lossy())
}

/// Append suffix to path, return normalized string
#[inline]
pub fn path_with_suffix(path: &Path, suffix: &str) -> String {
    format!("{}{}", path_to_string(path), suffix)
}

/// Create PathBuf from path + suffix
#[inline]
pub fn pathbuf_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(path_with_suffix(path, suffix))
}

/// Clean a relative path.
///
/// Drops `.` components. Returns `None` for absolute paths and for paths that
/// climb out of their root with `..`.
pub fn clean_relative(path: &Path) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(clean)
}

/// Iterate the non-empty proper ancestors of a relative path, nearest first.
///
/// `a/b/c.txt` yields `a/b` then `a`.
pub fn parent_dirs(path: &Path) -> impl Iterator<Item = &Path> {
    path.ancestors()
        .skip(1)
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Path relative to `root`, falling back to the path itself when it is not under `root`.
pub fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

/// Short display form of `path`: the last segment of `root` followed by the
/// path relative to `root`.
///
/// `short_path("/mods/build/bin/a.class", "/mods/build")` is `build/bin/a.class`.
pub fn short_path(path: &Path, root: &Path) -> String {
    let relative = relative_to(root, path);
    match root.file_name() {
        Some(name) => path_to_string(&Path::new(name).join(relative)),
        None => path_to_string(&relative),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("foo\\bar\\baz"), "foo/bar/baz");
        assert_eq!(normalize_path("foo/bar/baz"), "foo/bar/baz");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_pathbuf_with_suffix() {
        let path = PathBuf::from("net").join("example").join("Thing");
        let result = pathbuf_with_suffix(&path, "$py.class");
        assert_eq!(path_to_string(&result), "net/example/Thing$py.class");
    }

    #[test]
    fn test_clean_relative() {
        assert_eq!(
            clean_relative(Path::new("./a/./b.txt")),
            Some(PathBuf::from("a/b.txt"))
        );
        assert_eq!(clean_relative(Path::new("a/../b")), None);
        assert_eq!(clean_relative(Path::new("/etc/passwd")), None);
        assert_eq!(clean_relative(Path::new("")), Some(PathBuf::new()));
    }

    #[test]
    fn test_parent_dirs() {
        let dirs: Vec<_> = parent_dirs(Path::new("a/b/c.txt")).collect();
        assert_eq!(dirs, vec![Path::new("a/b"), Path::new("a")]);
        assert_eq!(parent_dirs(Path::new("top.txt")).count(), 0);
    }

    #[test]
    fn test_short_path() {
        let root = Path::new("/mods/build");
        assert_eq!(
            short_path(Path::new("/mods/build/bin/a.class"), root),
            "build/bin/a.class"
        );
    }
}
