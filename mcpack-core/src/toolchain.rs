//! External toolchain
//!
//! The actual compile and obfuscate steps are MCP shell/batch scripts, and
//! Python sources are compiled with Jython. This module builds those command
//! lines and runs them through a [`ScriptRunner`].

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::config::JythonConfig;

/// Errors from locating or running external tools
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    #[error("Failed to run {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exited with {status}", .program.display())]
    Failed { program: PathBuf, status: ExitStatus },

    #[error("Jython executable could not be found at {}. You must set the Jython executable in the configuration.", .0.display())]
    JythonMissingAt(PathBuf),

    #[error("{}\nYou must set {hint} in the configuration.", .problems.join("\n"))]
    JythonUnavailable {
        problems: Vec<String>,
        hint: &'static str,
    },
}

/// A program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs tool commands to completion
pub trait ScriptRunner {
    fn run(&mut self, command: &ToolCommand) -> Result<(), ToolchainError>;
}

/// Runs commands as child processes, inheriting stdio
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ScriptRunner for SystemRunner {
    fn run(&mut self, command: &ToolCommand) -> Result<(), ToolchainError> {
        tracing::debug!("Running {}", command);

        let mut process = Command::new(&command.program);
        process.args(&command.args);
        if let Some(dir) = &command.current_dir {
            process.current_dir(dir);
        }

        let status = process.status().map_err(|source| ToolchainError::Spawn {
            program: command.program.clone(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ToolchainError::Failed {
                program: command.program.clone(),
                status,
            })
        }
    }
}

fn mcp_script(name: &str, mcp_dir: &Path, mcp_config: &Path) -> ToolCommand {
    let program = if cfg!(windows) {
        format!("{}.bat", name)
    } else {
        format!("./{}.sh", name)
    };
    ToolCommand::new(program)
        .arg("-c")
        .arg(mcp_config)
        .current_dir(mcp_dir)
}

/// MCP recompile script
pub fn recompile_command(mcp_dir: &Path, mcp_config: &Path) -> ToolCommand {
    mcp_script("recompile", mcp_dir, mcp_config)
}

/// MCP reobfuscation script (SRG names)
pub fn reobfuscate_command(mcp_dir: &Path, mcp_config: &Path) -> ToolCommand {
    mcp_script("reobfuscate_srg", mcp_dir, mcp_config)
}

/// Jython invocation that byte-compiles every Python file under `dir`
pub fn compileall_command(jython: ToolCommand, dir: &Path) -> ToolCommand {
    jython.arg("-m").arg("compileall").arg(dir)
}

/// Find Jython, searching `PATH` for anything not configured
pub fn resolve_jython(config: &JythonConfig) -> Result<ToolCommand, ToolchainError> {
    resolve_jython_with(config, |name| which::which(name).ok())
}

/// Find Jython using `lookup` to search for executables by name
pub fn resolve_jython_with<F>(config: &JythonConfig, lookup: F) -> Result<ToolCommand, ToolchainError>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    let jython_exe = config
        .jython_exe
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| lookup("jython"));
    if let Some(exe) = jython_exe {
        if !exe.is_file() {
            return Err(ToolchainError::JythonMissingAt(exe));
        }
        tracing::debug!("jython: {}", exe.display());
        return Ok(ToolCommand::new(exe));
    }

    let java = match config
        .java_exe
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| lookup("java"))
    {
        None => Err("Java executable could not be found.".to_string()),
        Some(exe) if !exe.is_file() => Err(format!(
            "Java executable could not be found at {}.",
            exe.display()
        )),
        Some(exe) => Ok(exe),
    };

    let jar = match config.jython_jar.as_ref().map(PathBuf::from) {
        None => Err("Jython JAR could not be found.".to_string()),
        Some(jar) if !jar.is_file() => Err(format!(
            "Jython JAR could not be found at {}.",
            jar.display()
        )),
        Some(jar) => Ok(jar),
    };

    let jython_error = "Jython executable could not be found.".to_string();
    match (java, jar) {
        (Ok(java), Ok(jar)) => {
            tracing::debug!("java: {}, jar: {}", java.display(), jar.display());
            Ok(ToolCommand::new(java).arg("-jar").arg(jar))
        }
        (Err(java_error), Err(jar_error)) => Err(ToolchainError::JythonUnavailable {
            problems: vec![jython_error, java_error, jar_error],
            hint: "either the Jython executable or the Java executable with the Jython JAR",
        }),
        (Ok(_), Err(jar_error)) => Err(ToolchainError::JythonUnavailable {
            problems: vec![jython_error, jar_error],
            hint: "either the Jython executable or the Jython JAR",
        }),
        (Err(java_error), Ok(_)) => Err(ToolchainError::JythonUnavailable {
            problems: vec![java_error],
            hint: "the Java executable",
        }),
    }
}
