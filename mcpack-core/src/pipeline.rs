//! Mod build pipeline
//!
//! Aggregates the Forge/MCP sources and the mod sources into the build
//! directory, runs the MCP recompile and reobfuscate scripts (and Jython for
//! Python sources), then packages the reobfuscated classes into the mod jar.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::ResolvedConfig;
use crate::jar::{JarBuilder, JarStats};
use crate::mcp::{McpConfig, MCP_CONFIG_FILE};
use crate::path_utils::{pathbuf_with_suffix, short_path};
use crate::pathspec::iter_tree;
use crate::sync::{SyncReport, TreeSync};
use crate::toolchain::{
    compileall_command, recompile_command, reobfuscate_command, resolve_jython, ScriptRunner,
    SystemRunner,
};

/// Outcome of a successful build
#[derive(Debug, Clone)]
pub struct BuildSummary {
    /// The mod jar that was written
    pub jar_path: PathBuf,
    /// Synchronizations performed, labelled by destination
    pub syncs: Vec<(String, SyncReport)>,
    /// Compiled classes (Java and Python) packaged
    pub classes_packaged: usize,
    /// Sources with no compiled class to package
    pub missing_classes: Vec<PathBuf>,
    /// Extra files packaged
    pub extra_files: usize,
    pub jar: JarStats,
}

/// Build the mod, running external scripts as child processes
pub fn build_mod(config: &ResolvedConfig) -> Result<BuildSummary> {
    build_mod_with(config, &mut SystemRunner)
}

/// Build the mod, running external scripts through `runner`
pub fn build_mod_with(config: &ResolvedConfig, runner: &mut dyn ScriptRunner) -> Result<BuildSummary> {
    if !config.forge_dir.is_dir() {
        anyhow::bail!("Forge directory {} does not exist.", config.forge_dir.display());
    }
    if !config.mcp_dir.is_dir() {
        anyhow::bail!("MCP directory {} does not exist.", config.mcp_dir.display());
    }

    let build_dir = &config.build_dir;
    fs::create_dir_all(build_dir)
        .with_context(|| format!("Failed to create build directory {}", build_dir.display()))?;

    // MCP writes everything under the build directory.
    let mcp_file = build_dir.join(MCP_CONFIG_FILE);
    tracing::info!("Create MCP config at {}", short_path(&mcp_file, build_dir));
    McpConfig::for_build(build_dir, &config.library_dir).write(&mcp_file)?;

    let mut syncs = Vec::new();

    // "bin" receives every compiled class; "temp" holds intermediate jars.
    for name in ["bin", "temp"] {
        let src = config.mcp_dir.join(name);
        let dest = build_dir.join(name);
        if !src.is_dir() {
            tracing::warn!("Skipping {}: directory does not exist", short_path(&src, &config.forge_dir));
            continue;
        }
        tracing::info!(
            "Copy from {} to {}",
            short_path(&src, &config.forge_dir),
            short_path(&dest, build_dir)
        );
        let report = TreeSync::new(&src, &dest)
            .run()
            .with_context(|| format!("Failed to sync {}", src.display()))?;
        syncs.push((name.to_string(), report));
    }

    let mcp_src_dir = config.mcp_dir.join("src").join("minecraft");
    tracing::info!("Scan {}", short_path(&mcp_src_dir, &config.forge_dir));
    let mcp_src_files = iter_tree(&mcp_src_dir)
        .with_context(|| format!("Failed to scan MCP sources in {}", mcp_src_dir.display()))?;

    let source_dir = &config.source_dir;
    tracing::info!("Scan {}", source_dir.display());
    let java_files = config.java.match_tree(source_dir)?;
    let python_files = config.python.match_tree(source_dir)?;

    // The aggregated source directory holds both trees; each sync keeps the other's files.
    let keep: BTreeSet<&PathBuf> = mcp_src_files
        .iter()
        .chain(&java_files)
        .chain(&python_files)
        .collect();

    let dest_src = build_dir.join("src").join("minecraft");
    tracing::info!(
        "Copy from {} to {}",
        short_path(&mcp_src_dir, &config.forge_dir),
        short_path(&dest_src, build_dir)
    );
    let report = TreeSync::new(&mcp_src_dir, &dest_src)
        .files(&mcp_src_files)
        .keep(&keep)
        .run()
        .context("Failed to sync MCP sources")?;
    syncs.push(("src (mcp)".to_string(), report));

    tracing::info!("Copy from {} to {}", source_dir.display(), short_path(&dest_src, build_dir));
    let report = TreeSync::new(source_dir, &dest_src)
        .files(java_files.iter().chain(&python_files))
        .keep(&keep)
        .run()
        .context("Failed to sync mod sources")?;
    syncs.push(("src (mod)".to_string(), report));

    tracing::info!("Compile mod");
    runner.run(&recompile_command(&config.mcp_dir, &mcp_file))?;

    tracing::info!("Obfuscate mod");
    runner.run(&reobfuscate_command(&config.mcp_dir, &mcp_file))?;

    if !python_files.is_empty() {
        tracing::info!("Find Jython");
        let jython = resolve_jython(&config.jython)?;
        tracing::info!("Compile python source");
        runner.run(&compileall_command(jython, &dest_src))?;
    }

    let jar_path = build_dir.join(format!("{}.jar", config.name));
    tracing::info!("Create mod jar at {}", short_path(&jar_path, build_dir));
    let mut jar = JarBuilder::create(&jar_path)?;
    let mut classes_packaged = 0;
    let mut missing_classes = Vec::new();

    // Only classes compiled from the mod's own sources are packaged.
    let reobf_dir = build_dir.join("reobf").join("minecraft");
    tracing::info!("Package compiled java code");
    for file in &java_files {
        let class_file = file.with_extension("class");
        if package_class(&mut jar, &reobf_dir, &class_file)? {
            classes_packaged += 1;
        } else {
            tracing::warn!(
                "Source file {} was not compiled to class file {}",
                file.display(),
                short_path(&reobf_dir.join(&class_file), build_dir)
            );
            missing_classes.push(file.clone());
        }
    }

    if !python_files.is_empty() {
        tracing::info!("Package compiled python code");
        for file in &python_files {
            let class_file = pathbuf_with_suffix(&file.with_extension(""), "$py.class");
            if package_class(&mut jar, &dest_src, &class_file)? {
                classes_packaged += 1;
            } else {
                tracing::warn!(
                    "Source file {} was not compiled to class file {}",
                    file.display(),
                    short_path(&dest_src.join(&class_file), build_dir)
                );
                missing_classes.push(file.clone());
            }
            jar.add_file(&source_dir.join(file), file)?;
        }
    }

    let mut extra_files = 0;
    if !config.extra.is_empty() {
        tracing::info!("Package extra files");
        for file in config.extra.match_tree(source_dir)? {
            tracing::debug!("Copy {} to {}", file.display(), file.display());
            if jar.add_file(&source_dir.join(&file), &file)? {
                extra_files += 1;
            }
        }
    }

    if !config.library_package.is_empty() {
        tracing::info!("Package libraries");
        for file in config.library_package.match_tree(&config.library_dir)? {
            let library = config.library_dir.join(&file);
            tracing::info!(
                "Copy {} into {}",
                short_path(&library, &config.library_dir),
                short_path(&jar_path, build_dir)
            );
            jar.merge_library(&library)?;
        }
    }

    let jar_stats = jar.finish()?;
    Ok(BuildSummary {
        jar_path,
        syncs,
        classes_packaged,
        missing_classes,
        extra_files,
        jar: jar_stats,
    })
}

fn package_class(jar: &mut JarBuilder, class_root: &Path, class_file: &Path) -> Result<bool> {
    let src = class_root.join(class_file);
    if !src.is_file() {
        return Ok(false);
    }
    tracing::debug!("Copy {} to {}", src.display(), class_file.display());
    jar.add_file(&src, class_file)
}
