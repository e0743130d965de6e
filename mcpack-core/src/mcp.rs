//! MCP configuration file
//!
//! The recompile and reobfuscate scripts read their working directories from
//! an INI file passed with `-c`. Everything they write is redirected under the
//! build directory so the Forge checkout stays untouched.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Name of the generated MCP configuration
pub const MCP_CONFIG_FILE: &str = "mcp.cfg";

/// Directory overrides written to the `[DEFAULT]` section of `mcp.cfg`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpConfig {
    entries: Vec<(&'static str, PathBuf)>,
}

impl McpConfig {
    /// Overrides that point every MCP output directory into `build_dir`
    pub fn for_build(build_dir: &Path, library_dir: &Path) -> Self {
        let entries = vec![
            ("DirBin", build_dir.join("bin")),
            ("DirEclipse", build_dir.join("eclipse")),
            ("DirLib", library_dir.to_path_buf()),
            ("DirLogs", build_dir.join("log").join("mcp")),
            ("DirModSrc", build_dir.join("modsrc")),
            ("DirReobf", build_dir.join("reobf")),
            ("DirSrc", build_dir.join("src")),
            ("DirTemp", build_dir.join("temp")),
            ("DirTempBin", build_dir.join("temp").join("bin")),
            ("DirTempCls", build_dir.join("temp").join("cls")),
            ("DirTempSrc", build_dir.join("temp").join("src")),
        ];
        Self { entries }
    }

    /// Value of a key (case sensitive)
    pub fn get(&self, key: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_path())
    }

    /// Write the INI file
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_string())
            .with_context(|| format!("Failed to write MCP config: {}", path.display()))
    }
}

impl fmt::Display for McpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[DEFAULT]")?;
        for (key, value) in &self.entries {
            writeln!(f, "{} = {}", key, value.display())?;
        }
        writeln!(f)
    }
}
