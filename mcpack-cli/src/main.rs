//! mcpack CLI
//!
//! Command-line interface for scaffolding, building and packaging Minecraft
//! Forge mods.

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mcpack_core::{
    build_mod, init_mod, BuildConfig, InitOptions, ModIdentity, TreeSync, DEFAULT_CONFIG_FILE,
    DEFAULT_MC_VERSION,
};

#[derive(Parser)]
#[command(name = "mcpack")]
#[command(about = "Build and package Minecraft Forge mods")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the scaffolding for a new mod
    Init {
        /// Java package of the mod (lowercase segments separated by periods)
        #[arg(long, value_name = "PKG")]
        mod_package: String,

        /// Mod ID (default: last segment of the package)
        #[arg(long, value_name = "ID")]
        mod_id: Option<String>,

        /// Main class of the mod (default: derived from the mod ID)
        #[arg(long, value_name = "CLASS")]
        mod_class: Option<String>,

        /// Display name of the mod (default: the mod ID)
        #[arg(long, value_name = "NAME")]
        mod_name: Option<String>,

        /// Minecraft version the mod targets
        #[arg(long, value_name = "VERSION", default_value = DEFAULT_MC_VERSION)]
        mc_version: String,

        /// Directory to create the mod in. Other relative paths are relative to it.
        #[arg(long, value_name = "DIR", default_value = ".")]
        mod_dir: PathBuf,

        /// Build configuration file to generate
        #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
        config_file: String,

        /// Minecraft Forge source directory
        #[arg(long, value_name = "DIR", default_value = "forge")]
        forge_dir: String,

        /// Directory to build the mod in
        #[arg(long, value_name = "DIR", default_value = "build")]
        build_dir: String,

        /// Directory for additional libraries required by the mod
        #[arg(long, value_name = "DIR", default_value = "lib")]
        library_dir: String,

        /// Directory for the mod sources
        #[arg(long, value_name = "DIR", default_value = "src")]
        source_dir: String,

        /// Also create a Python mod class
        #[arg(long)]
        python: bool,

        /// Print verbose output (-v for info, -vv for debug)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
    },

    /// Build and package the mod
    Build {
        /// Build configuration file
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
        config_file: PathBuf,

        /// Print verbose output (-v for info, -vv for debug)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
    },

    /// Mirror a source directory into a destination directory
    Sync {
        /// Source directory
        source: PathBuf,

        /// Destination directory
        dest: PathBuf,

        /// Only mirror these files (relative to the source); repeatable
        #[arg(long = "file", value_name = "PATH")]
        files: Vec<PathBuf>,

        /// Never delete these files (relative to the destination); repeatable
        #[arg(long = "keep", value_name = "PATH")]
        keep: Vec<PathBuf>,

        /// Print verbose output (-v for info, -vv for debug)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            mod_package,
            mod_id,
            mod_class,
            mod_name,
            mc_version,
            mod_dir,
            config_file,
            forge_dir,
            build_dir,
            library_dir,
            source_dir,
            python,
            verbose,
        } => {
            logging::init(verbose);
            let identity = ModIdentity::new(&mod_package, mod_id.as_deref(), mod_class.as_deref())?;
            let options = InitOptions {
                mod_name: mod_name.unwrap_or_else(|| identity.id.clone()),
                identity,
                mc_version,
                mod_dir,
                config_file,
                forge_dir,
                build_dir,
                library_dir,
                source_dir,
                python,
            };
            cmd_init(&options)?;
        }
        Commands::Build {
            config_file,
            verbose,
        } => {
            cmd_build(&config_file, verbose)?;
        }
        Commands::Sync {
            source,
            dest,
            files,
            keep,
            verbose,
        } => {
            logging::init(verbose);
            cmd_sync(source, dest, files, keep)?;
        }
    }

    Ok(())
}

/// Create a new mod
fn cmd_init(options: &InitOptions) -> Result<()> {
    let written = init_mod(options).context("Failed to initialize mod")?;

    println!(
        "Initialized mod '{}' ({}) at {}",
        options.identity.id,
        options.identity.class,
        options.mod_dir.display()
    );
    for path in &written {
        println!("  {}", path.display());
    }
    println!("\nNext steps:");
    println!("  1. Put the Minecraft Forge sources in {}", options.forge_dir);
    println!("  2. Run: mcpack build");

    Ok(())
}

/// Build the mod described by a configuration file
fn cmd_build(config_file: &Path, verbose: u8) -> Result<()> {
    let config = BuildConfig::load(config_file)?;
    let base_dir = std::env::current_dir().context("Failed to get current directory")?;
    let resolved = config.resolve(&base_dir)?;

    logging::init_with_build_log(verbose, &resolved.build_dir)?;

    let summary = build_mod(&resolved).map_err(|err| {
        tracing::error!("Failed to build mod: {:#}", err);
        err
    })?;

    for (label, report) in &summary.syncs {
        tracing::info!("{}: {}", label, report);
    }
    if !summary.missing_classes.is_empty() {
        println!(
            "Warning: {} source file(s) had no compiled class",
            summary.missing_classes.len()
        );
    }
    println!(
        "Built {} ({} classes, {} extra files, {} libraries)",
        summary.jar_path.display(),
        summary.classes_packaged,
        summary.extra_files,
        summary.jar.libraries
    );

    Ok(())
}

/// Synchronize two directories
fn cmd_sync(source: PathBuf, dest: PathBuf, files: Vec<PathBuf>, keep: Vec<PathBuf>) -> Result<()> {
    let mut sync = TreeSync::new(&source, &dest);
    if !files.is_empty() {
        sync = sync.files(files);
    }
    if !keep.is_empty() {
        sync = sync.keep(keep);
    }

    let report = sync
        .run()
        .with_context(|| format!("Failed to sync {} to {}", source.display(), dest.display()))?;

    if report.is_noop() {
        println!("{} is up to date", dest.display());
    } else {
        println!("{}", report);
    }

    Ok(())
}
