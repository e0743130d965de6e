//! Logging setup
//!
//! Console output goes to stdout. The build command also appends to a log
//! file in the build directory, with timestamps and without ANSI colors.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Name of the build log under `<build dir>/log`
pub const LOG_FILE: &str = "mcpack.log";

/// Level for a `-v` count: warnings by default, then info, then debug
fn level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// `RUST_LOG` wins over `-v` when set
fn env_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level(verbose)))
}

/// Log to the console only
pub fn init(verbose: u8) {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(console_layer)
        .try_init();
}

/// Log to the console and append to `<build_dir>/log/mcpack.log`
pub fn init_with_build_log(verbose: u8, build_dir: &Path) -> Result<()> {
    let log_dir = build_dir.join("log");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let log_file = log_dir.join(LOG_FILE);
    let file = open_log(&log_file)?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .without_time();
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(console_layer)
        .with(file_layer)
        .try_init();

    tracing::info!("Log to {}", log_file.display());
    Ok(())
}

fn open_log(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}
