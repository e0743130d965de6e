//! Mod jar assembly
//!
//! Writes a deflate-compressed jar from loose files and merges the entries of
//! library archives into it. Entry names always use forward slashes.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::path_utils::path_to_string;

/// Statistics from writing a jar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JarStats {
    /// Entries written
    pub entries: usize,
    /// Entries skipped because the name was already taken
    pub duplicates: usize,
    /// Libraries merged in
    pub libraries: usize,
}

/// An open jar being written
pub struct JarBuilder {
    path: PathBuf,
    writer: ZipWriter<BufWriter<File>>,
    names: HashSet<String>,
    stats: JarStats,
}

impl JarBuilder {
    /// Create (or truncate) the jar at `path`
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create jar directory")?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create jar: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: ZipWriter::new(BufWriter::new(file)),
            names: HashSet::new(),
            stats: JarStats::default(),
        })
    }

    /// Add a file from disk under the entry name `entry`
    pub fn add_file(&mut self, src: &Path, entry: &Path) -> Result<bool> {
        let data = fs::read(src).with_context(|| format!("Failed to read {}", src.display()))?;
        self.add_bytes(&path_to_string(entry), &data, CompressionMethod::Deflated)
    }

    /// Add raw bytes. Returns false when an entry of that name already exists.
    pub fn add_bytes(&mut self, name: &str, data: &[u8], method: CompressionMethod) -> Result<bool> {
        if !self.names.insert(name.to_string()) {
            tracing::warn!("Skipping duplicate jar entry {}", name);
            self.stats.duplicates += 1;
            return Ok(false);
        }

        let options = SimpleFileOptions::default().compression_method(method);
        self.writer
            .start_file(name, options)
            .with_context(|| format!("Failed to start jar entry {}", name))?;
        self.writer
            .write_all(data)
            .with_context(|| format!("Failed to write jar entry {}", name))?;
        self.stats.entries += 1;
        Ok(true)
    }

    /// Copy every entry of a JAR or ZIP library except `META-INF` and directories
    pub fn merge_library(&mut self, library: &Path) -> Result<usize> {
        let file = File::open(library)
            .with_context(|| format!("Failed to open library {}", library.display()))?;
        let mut archive = ZipArchive::new(file)
            .with_context(|| format!("Failed to read library {}", library.display()))?;

        let mut merged = 0;
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let name = entry.name().to_string();
            if name.starts_with("META-INF") || entry.is_dir() {
                continue;
            }

            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .with_context(|| format!("Failed to read {} from {}", name, library.display()))?;

            let method = match entry.compression() {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            if self.add_bytes(&name, &data, method)? {
                merged += 1;
            }
        }

        self.stats.libraries += 1;
        Ok(merged)
    }

    /// Finish the archive and flush it to disk
    pub fn finish(self) -> Result<JarStats> {
        let mut inner = self
            .writer
            .finish()
            .with_context(|| format!("Failed to finish jar: {}", self.path.display()))?;
        inner.flush()?;
        Ok(self.stats)
    }
}
