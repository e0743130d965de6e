//! mcpack Core Library
//!
//! This crate provides the core functionality for mcpack:
//! - Tree synchronization (mirroring a source tree into a destination)
//! - Build configuration and gitignore-style path patterns
//! - MCP configuration and external toolchain invocation
//! - Mod jar packaging
//! - New mod scaffolding

pub mod config;
pub mod jar;
pub mod mcp;
pub mod path_utils;
pub mod pathspec;
pub mod pipeline;
pub mod scaffold;
pub mod sync;
pub mod templates;
pub mod toolchain;

// Re-export commonly used types
pub use config::{BuildConfig, ConfigError, JythonConfig, ResolvedConfig, DEFAULT_CONFIG_FILE};
pub use jar::{JarBuilder, JarStats};
pub use mcp::{McpConfig, MCP_CONFIG_FILE};
pub use pathspec::{iter_tree, PathSpec, PathSpecError};
pub use pipeline::{build_mod, build_mod_with, BuildSummary};
pub use scaffold::{init_mod, IdentityError, InitOptions, ModIdentity, DEFAULT_MC_VERSION};
pub use sync::{sync_tree, SyncAction, SyncError, SyncReport, TreeSync};
pub use toolchain::{ScriptRunner, SystemRunner, ToolCommand, ToolchainError};
pub use path_utils::{normalize_path, path_to_string, path_with_suffix, pathbuf_with_suffix};
