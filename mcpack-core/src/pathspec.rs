//! Gitignore-style path matching
//!
//! Source, extra-file and library selections in `mcpack.yaml` are written as
//! gitignore patterns. Each pattern compiles to one or two globs; when several
//! patterns match a path the last one decides, so `!` can re-include or exclude.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::path_utils::{path_to_string, relative_to};

/// Errors from compiling patterns or scanning a tree
#[derive(Debug, thiserror::Error)]
pub enum PathSpecError {
    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to scan {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Debug, Clone)]
struct Pattern {
    line: String,
    negated: bool,
}

/// A compiled list of gitignore-style patterns
#[derive(Debug, Clone)]
pub struct PathSpec {
    patterns: Vec<Pattern>,
    /// Index of the owning pattern for each glob in `set`
    owners: Vec<usize>,
    set: GlobSet,
}

impl PathSpec {
    /// Compile pattern lines. Blank lines and `#` comments are skipped.
    pub fn from_lines<I, S>(lines: I) -> Result<Self, PathSpecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = Vec::new();
        let mut owners = Vec::new();
        let mut builder = GlobSetBuilder::new();

        for line in lines {
            let line = line.as_ref();
            let Some((negated, globs)) = translate(line) else {
                continue;
            };

            for glob in globs {
                let compiled = GlobBuilder::new(&glob)
                    .literal_separator(true)
                    .build()
                    .map_err(|source| PathSpecError::InvalidPattern {
                        pattern: line.to_string(),
                        source,
                    })?;
                builder.add(compiled);
                owners.push(patterns.len());
            }
            patterns.push(Pattern {
                line: line.to_string(),
                negated,
            });
        }

        let set = builder.build().map_err(|source| PathSpecError::InvalidPattern {
            pattern: patterns
                .iter()
                .map(|p| p.line.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            source,
        })?;

        Ok(Self {
            patterns,
            owners,
            set,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check a path relative to the tree root
    pub fn matches(&self, path: &Path) -> bool {
        let candidate = path_to_string(path);
        self.set
            .matches(candidate.as_str())
            .into_iter()
            .map(|glob| self.owners[glob])
            .max()
            .map_or(false, |owner| !self.patterns[owner].negated)
    }

    /// Relative paths of the files under `root` that match
    pub fn match_tree(&self, root: &Path) -> Result<Vec<PathBuf>, PathSpecError> {
        Ok(iter_tree(root)?
            .into_iter()
            .filter(|path| self.matches(path))
            .collect())
    }
}

/// Relative paths of every file under `root`, following links, sorted
pub fn iter_tree(root: &Path) -> Result<Vec<PathBuf>, PathSpecError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| PathSpecError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_dir() {
            files.push(relative_to(root, entry.path()));
        }
    }
    Ok(files)
}

/// Turn one gitignore line into globs, or `None` for blanks and comments.
fn translate(line: &str) -> Option<(bool, Vec<String>)> {
    let mut pattern = line.trim_end();
    if pattern.is_empty() || pattern.starts_with('#') {
        return None;
    }

    let negated = pattern.starts_with('!');
    if negated {
        pattern = &pattern[1..];
    } else if pattern.starts_with("\\!") || pattern.starts_with("\\#") {
        pattern = &pattern[1..];
    }

    let dir_only = pattern.ends_with('/');
    let pattern = pattern.trim_end_matches('/');
    if pattern.is_empty() {
        return None;
    }

    let anchored = pattern.starts_with('/') || pattern.contains('/');
    let pattern = pattern.trim_start_matches('/');
    let base = if anchored || pattern.starts_with("**/") {
        pattern.to_string()
    } else {
        format!("**/{}", pattern)
    };

    // A pattern naming a directory selects everything beneath it.
    let mut globs = vec![format!("{}/**", base)];
    if !dir_only {
        globs.insert(0, base);
    }
    Some((negated, globs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn spec(lines: &[&str]) -> PathSpec {
        PathSpec::from_lines(lines).unwrap()
    }

    #[test]
    fn test_unanchored_matches_any_depth() {
        let spec = spec(&["*.java"]);
        assert!(spec.matches(Path::new("Mod.java")));
        assert!(spec.matches(Path::new("com/example/Mod.java")));
        assert!(!spec.matches(Path::new("com/example/mod.py")));
    }

    #[test]
    fn test_anchored_patterns() {
        let spec = spec(&["/assets/*.png", "lang/en_US.lang"]);
        assert!(spec.matches(Path::new("assets/logo.png")));
        assert!(!spec.matches(Path::new("other/assets/logo.png")));
        assert!(!spec.matches(Path::new("assets/nested/logo.png")));
        assert!(spec.matches(Path::new("lang/en_US.lang")));
    }

    #[test]
    fn test_directory_patterns() {
        let spec = spec(&["assets/"]);
        assert!(spec.matches(Path::new("assets/textures/block.png")));
        assert!(!spec.matches(Path::new("assets")));
    }

    #[test]
    fn test_negation_last_match_wins() {
        let spec = spec(&["*.jar", "!forge-*.jar"]);
        assert!(spec.matches(Path::new("guava.jar")));
        assert!(!spec.matches(Path::new("forge-1.6.4.jar")));
    }

    #[test]
    fn test_comments_and_blanks() {
        let spec = spec(&["# libraries", "", "   "]);
        assert!(spec.is_empty());
        assert!(!spec.matches(Path::new("anything")));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = PathSpec::from_lines(["src/[abc"]).unwrap_err();
        assert!(matches!(err, PathSpecError::InvalidPattern { .. }));
    }

    #[test]
    fn test_match_tree() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("com/example")).unwrap();
        fs::write(temp.path().join("com/example/Mod.java"), "").unwrap();
        fs::write(temp.path().join("com/example/mod.py"), "").unwrap();
        fs::write(temp.path().join("mcmod.info"), "").unwrap();

        let all = iter_tree(temp.path()).unwrap();
        assert_eq!(all.len(), 3);

        let java = spec(&["*.java"]).match_tree(temp.path()).unwrap();
        assert_eq!(java, vec![PathBuf::from("com/example/Mod.java")]);
    }
}
