//! New mod scaffolding
//!
//! Creates the mod directory layout, the build configuration and a starter
//! mod class from the embedded templates.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::templates::{
    substitute, CONFIG_TEMPLATE, JAVA_MOD_TEMPLATE, MCMOD_INFO_TEMPLATE, PYTHON_MOD_TEMPLATE,
};

/// Minecraft version written to `mcmod.info` when none is given
pub const DEFAULT_MC_VERSION: &str = "1.6.2";

/// Invalid mod identity
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Mod package {0:?} must be at least two lowercase segments separated by periods (e.g. com.example)")]
    Package(String),

    #[error("Mod ID {0:?} must begin with a lowercase letter followed by lowercase letters, numbers, or underscores")]
    Id(String),

    #[error("Mod class {0:?} must begin with an uppercase letter followed by letters, numbers, or underscores")]
    Class(String),
}

/// Java package, mod ID and main class of a mod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModIdentity {
    pub package: String,
    pub id: String,
    pub class: String,
}

impl ModIdentity {
    /// Validate the identity, deriving the ID from the last package segment
    /// and the class from the ID when they are not given.
    pub fn new(package: &str, id: Option<&str>, class: Option<&str>) -> Result<Self, IdentityError> {
        if !package_re().is_match(package) {
            return Err(IdentityError::Package(package.to_string()));
        }

        let id = match id {
            Some(id) => id.to_string(),
            None => package.rsplit('.').next().unwrap_or(package).to_string(),
        };
        if !id_re().is_match(&id) {
            return Err(IdentityError::Id(id));
        }

        let class = match class {
            Some(class) => class.to_string(),
            None => default_class(&id),
        };
        if !class_re().is_match(&class) {
            return Err(IdentityError::Class(class));
        }

        Ok(Self {
            package: package.to_string(),
            id,
            class,
        })
    }

    /// Directory of the package below the source root
    pub fn package_dir(&self) -> PathBuf {
        self.package.split('.').collect()
    }
}

fn package_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9]*(\.[a-z][a-z0-9]*)+$").expect("package pattern is valid"))
}

fn id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("id pattern is valid"))
}

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Za-z0-9_]*$").expect("class pattern is valid"))
}

/// `example_thing` becomes `ExampleThingMod`
fn default_class(id: &str) -> String {
    let mut class: String = id
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    class.push_str("Mod");
    class
}

/// Options for `mcpack init`. Relative directories are relative to `mod_dir`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub identity: ModIdentity,
    pub mod_name: String,
    pub mc_version: String,
    pub mod_dir: PathBuf,
    pub config_file: String,
    pub forge_dir: String,
    pub build_dir: String,
    pub library_dir: String,
    pub source_dir: String,
    pub python: bool,
}

impl InitOptions {
    /// Options with the default layout for a mod
    pub fn new(identity: ModIdentity) -> Self {
        Self {
            mod_name: identity.id.clone(),
            identity,
            mc_version: DEFAULT_MC_VERSION.to_string(),
            mod_dir: PathBuf::from("."),
            config_file: DEFAULT_CONFIG_FILE.to_string(),
            forge_dir: "forge".to_string(),
            build_dir: "build".to_string(),
            library_dir: "lib".to_string(),
            source_dir: "src".to_string(),
            python: false,
        }
    }

    /// Template values. Values embedded in YAML or JSON are quoted.
    fn template_values(&self) -> Result<HashMap<&'static str, String>> {
        let quote = |value: &str| serde_json::to_string(value).context("Failed to quote template value");
        let identity = &self.identity;

        let mut values = HashMap::new();
        values.insert("mod_id", quote(&identity.id)?);
        values.insert("mod_name", quote(&self.mod_name)?);
        values.insert("mc_version", quote(&self.mc_version)?);
        values.insert("build_dir", quote(&self.build_dir)?);
        values.insert("forge_dir", quote(&self.forge_dir)?);
        values.insert("library_dir", quote(&self.library_dir)?);
        values.insert("source_dir", quote(&self.source_dir)?);
        Ok(values)
    }

    /// Template values for source code, which embeds them verbatim
    fn source_values(&self) -> HashMap<&'static str, String> {
        let identity = &self.identity;
        let mut values = HashMap::new();
        values.insert("mod_id", identity.id.clone());
        values.insert("mod_name", self.mod_name.clone());
        values.insert("mod_package", identity.package.clone());
        values.insert("mod_class", identity.class.clone());
        values
    }
}

/// Create the scaffolding for a new mod. Returns the files written.
pub fn init_mod(options: &InitOptions) -> Result<Vec<PathBuf>> {
    let mod_dir = &options.mod_dir;
    let forge_dir = mod_dir.join(&options.forge_dir);
    let library_dir = mod_dir.join(&options.library_dir);

    // A Forge checkout and a library directory may already be in place.
    if mod_dir.exists() {
        let entries = fs::read_dir(mod_dir)
            .with_context(|| format!("Failed to read mod directory {}", mod_dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path != forge_dir && path != library_dir {
                anyhow::bail!("Mod directory {} is not empty.", mod_dir.display());
            }
        }
    } else {
        tracing::info!("Create {}", mod_dir.display());
        fs::create_dir_all(mod_dir)
            .with_context(|| format!("Failed to create mod directory {}", mod_dir.display()))?;
    }

    if !forge_dir.is_dir() {
        tracing::warn!(
            "Forge directory {} does not exist. It must be created before the mod can be built.",
            forge_dir.display()
        );
    }

    tracing::info!("Create {}", library_dir.display());
    fs::create_dir_all(&library_dir)
        .with_context(|| format!("Failed to create library directory {}", library_dir.display()))?;

    let source_dir = mod_dir.join(&options.source_dir);
    let package_dir = source_dir.join(options.identity.package_dir());
    tracing::info!("Create {}", package_dir.display());
    fs::create_dir_all(&package_dir)
        .with_context(|| format!("Failed to create source directory {}", package_dir.display()))?;

    let quoted = options.template_values()?;
    let verbatim = options.source_values();
    let identity = &options.identity;

    let mut rendered = vec![
        (mod_dir.join(&options.config_file), CONFIG_TEMPLATE, &quoted),
        (source_dir.join("mcmod.info"), MCMOD_INFO_TEMPLATE, &quoted),
        (
            package_dir.join(format!("{}.java", identity.class)),
            JAVA_MOD_TEMPLATE,
            &verbatim,
        ),
    ];
    if options.python {
        rendered.push((
            package_dir.join(format!("{}.py", identity.id)),
            PYTHON_MOD_TEMPLATE,
            &verbatim,
        ));
    }

    let mut written = Vec::with_capacity(rendered.len());
    for (path, template, values) in rendered {
        write_template(&path, template, values)?;
        written.push(path);
    }
    Ok(written)
}

fn write_template(path: &Path, template: &str, values: &HashMap<&'static str, String>) -> Result<()> {
    tracing::info!("Create {}", path.display());
    let content = substitute(template, values)
        .with_context(|| format!("Failed to render {}", path.display()))?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
