//! Build configuration
//!
//! Defines the `mcpack.yaml` format. Every key is optional; missing keys and
//! keys set to `null` fall back to the defaults below. Paths are resolved
//! once, at load time, into a [`ResolvedConfig`].

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::pathspec::{PathSpec, PathSpecError};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "mcpack.yaml";

/// The build configuration file (mcpack.yaml)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Mod name, used for the jar file name
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub forge: ForgeSection,

    #[serde(default)]
    pub library: LibrarySection,

    #[serde(default)]
    pub source: SourceSection,

    #[serde(default)]
    pub jython: JythonConfig,
}

fn default_name() -> String {
    "mod".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            build: BuildSection::default(),
            forge: ForgeSection::default(),
            library: LibrarySection::default(),
            source: SourceSection::default(),
            jython: JythonConfig::default(),
        }
    }
}

/// Build directory settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSection {
    /// Directory to build the mod in (default: "build")
    #[serde(default = "default_build_dir")]
    pub dir: String,
}

fn default_build_dir() -> String {
    "build".to_string()
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            dir: default_build_dir(),
        }
    }
}

/// Forge settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForgeSection {
    /// Forge source directory; MCP lives in its `mcp` subdirectory
    #[serde(default = "default_forge_dir")]
    pub dir: String,
}

fn default_forge_dir() -> String {
    "forge".to_string()
}

impl Default for ForgeSection {
    fn default() -> Self {
        Self {
            dir: default_forge_dir(),
        }
    }
}

/// Additional library settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibrarySection {
    /// Directory containing additional libraries (default: "lib")
    #[serde(default = "default_library_dir")]
    pub dir: String,

    /// Patterns selecting libraries (JAR or ZIP) to merge into the mod jar
    #[serde(default)]
    pub package: Vec<String>,
}

fn default_library_dir() -> String {
    "lib".to_string()
}

impl Default for LibrarySection {
    fn default() -> Self {
        Self {
            dir: default_library_dir(),
            package: Vec::new(),
        }
    }
}

/// Mod source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSection {
    /// Directory containing the Java and Python sources (default: "src")
    #[serde(default = "default_source_dir")]
    pub dir: String,

    #[serde(default = "default_java_patterns")]
    pub java: Vec<String>,

    #[serde(default = "default_python_patterns")]
    pub python: Vec<String>,

    /// Assets and any additional files to package
    #[serde(default)]
    pub extra: Vec<String>,
}

fn default_source_dir() -> String {
    "src".to_string()
}

fn default_java_patterns() -> Vec<String> {
    vec!["*.java".to_string()]
}

fn default_python_patterns() -> Vec<String> {
    vec!["*.py".to_string()]
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            dir: default_source_dir(),
            java: default_java_patterns(),
            python: default_python_patterns(),
            extra: Vec::new(),
        }
    }
}

/// Jython settings
///
/// When `jython_exe` is unset it is searched for on `PATH`. Failing that,
/// `jython_jar` is run with `java_exe` (also searched for when unset).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JythonConfig {
    #[serde(default)]
    pub jython_exe: Option<String>,

    #[serde(default)]
    pub jython_jar: Option<String>,

    #[serde(default)]
    pub java_exe: Option<String>,
}

/// Errors loading the build configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(
        "Found TAB character being used for indentation in {} on line {line}, column {column}:\n\n{source_line}\n{caret}\n\nUse spaces for indentation instead.",
        .path.display(),
        caret = caret(.column)
    )]
    TabIndentation {
        path: PathBuf,
        line: usize,
        column: usize,
        source_line: String,
    },

    #[error("Invalid pattern in {key}: {source}")]
    Pattern {
        key: &'static str,
        #[source]
        source: PathSpecError,
    },
}

fn caret(column: &usize) -> String {
    format!("{}^", " ".repeat(column.saturating_sub(1)))
}

impl BuildConfig {
    /// Load the configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, path)
    }

    /// Parse the configuration; `origin` is only used in error messages
    pub fn from_yaml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|source| parse_error(origin, content, source))?;

        let value = strip_nulls(value);
        if value.is_null() {
            return Ok(Self::default());
        }

        serde_yaml::from_value(value).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Expand environment variables, make directories absolute against
    /// `base_dir` and compile the pattern lists.
    pub fn resolve(&self, base_dir: &Path) -> Result<ResolvedConfig, ConfigError> {
        let dir = |value: &str| base_dir.join(expand_vars(value));
        let spec = |key: &'static str, lines: &[String]| {
            PathSpec::from_lines(lines).map_err(|source| ConfigError::Pattern { key, source })
        };

        let forge_dir = dir(&self.forge.dir);
        Ok(ResolvedConfig {
            name: self.name.clone(),
            build_dir: dir(&self.build.dir),
            mcp_dir: forge_dir.join("mcp"),
            forge_dir,
            library_dir: dir(&self.library.dir),
            library_package: spec("library.package", &self.library.package)?,
            source_dir: dir(&self.source.dir),
            java: spec("source.java", &self.source.java)?,
            python: spec("source.python", &self.source.python)?,
            extra: spec("source.extra", &self.source.extra)?,
            jython: JythonConfig {
                jython_exe: self.jython.jython_exe.as_deref().map(expand_vars),
                jython_jar: self.jython.jython_jar.as_deref().map(expand_vars),
                java_exe: self.jython.java_exe.as_deref().map(expand_vars),
            },
        })
    }
}

/// Configuration with absolute paths and compiled patterns
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub name: String,
    pub build_dir: PathBuf,
    pub forge_dir: PathBuf,
    pub mcp_dir: PathBuf,
    pub library_dir: PathBuf,
    pub library_package: PathSpec,
    pub source_dir: PathBuf,
    pub java: PathSpec,
    pub python: PathSpec,
    pub extra: PathSpec,
    pub jython: JythonConfig,
}

/// Remove `null` mapping entries so they fall back to defaults
fn strip_nulls(value: serde_yaml::Value) -> serde_yaml::Value {
    match value {
        serde_yaml::Value::Mapping(mapping) => serde_yaml::Value::Mapping(
            mapping
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        other => other,
    }
}

fn parse_error(origin: &Path, content: &str, source: serde_yaml::Error) -> ConfigError {
    let tabbed = content.lines().enumerate().find_map(|(index, line)| {
        let indent = &line[..line.len() - line.trim_start().len()];
        indent.find('\t').map(|column| (index, column, line))
    });

    match tabbed {
        Some((index, column, line)) => ConfigError::TabIndentation {
            path: origin.to_path_buf(),
            line: index + 1,
            column: column + 1,
            source_line: line.trim_end().to_string(),
        },
        None => ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        },
    }
}

/// Expand `$NAME` and `${NAME}`; unknown variables are left as written.
pub fn expand_vars(value: &str) -> String {
    static VAR: OnceLock<Regex> = OnceLock::new();
    let re = VAR.get_or_init(|| {
        Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
            .expect("variable pattern is valid")
    });

    re.replace_all(value, |caps: &Captures| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        env::var(name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
