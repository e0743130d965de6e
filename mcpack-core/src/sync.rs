//! Tree synchronizer
//!
//! One-way mirroring of a source directory into a destination directory.
//! Modification time is the only staleness signal: a destination file is
//! overwritten when it is older than its source, removed when nothing selects
//! or keeps it, and created when it is missing.
//!
//! Each call is self-contained. The call returns a [`SyncReport`] listing every
//! action it performed so callers can log or assert on it.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use filetime::FileTime;
use walkdir::WalkDir;

use crate::path_utils::{clean_relative, parent_dirs, path_to_string, relative_to};

/// Errors that abort a synchronization
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A selected source file does not exist
    #[error("Source file not found: {}", .path.display())]
    SourceMissing { path: PathBuf },

    /// The same directory was reached through two relative paths while following links
    #[error(
        "Real path {} was encountered at {} and then {}",
        .real.display(),
        .first.display(),
        .second.display()
    )]
    Cycle {
        real: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    /// A file or keep entry is absolute or escapes its root
    #[error("Invalid relative path: {}", .path.display())]
    InvalidPath { path: PathBuf },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single change made to the destination tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// File was missing from the destination and got copied in
    Created(PathBuf),
    /// Destination file was older than its source and got overwritten
    Updated(PathBuf),
    /// File was neither selected nor kept and got deleted
    RemovedFile(PathBuf),
    /// Directory was neither selected nor an ancestor of a kept path and got deleted with its contents
    RemovedDir(PathBuf),
    /// A deletion target disappeared before it could be removed
    TargetAlreadyAbsent(PathBuf),
}

impl SyncAction {
    /// Relative path the action applies to
    pub fn path(&self) -> &Path {
        match self {
            SyncAction::Created(path)
            | SyncAction::Updated(path)
            | SyncAction::RemovedFile(path)
            | SyncAction::RemovedDir(path)
            | SyncAction::TargetAlreadyAbsent(path) => path,
        }
    }
}

/// Actions performed by one synchronization, in the order they happened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub actions: Vec<SyncAction>,
}

impl SyncReport {
    /// Number of files written (created or updated)
    pub fn copies(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, SyncAction::Created(_) | SyncAction::Updated(_)))
            .count()
    }

    /// Number of files and directories removed
    pub fn removals(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, SyncAction::RemovedFile(_) | SyncAction::RemovedDir(_)))
            .count()
    }

    /// True when the destination was already in sync
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }

    fn record(&mut self, action: SyncAction) {
        tracing::debug!("{:?}", action);
        self.actions.push(action);
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = |pred: fn(&SyncAction) -> bool| self.actions.iter().filter(|a| pred(a)).count();
        write!(
            f,
            "{} created, {} updated, {} removed",
            count(|a| matches!(a, SyncAction::Created(_))),
            count(|a| matches!(a, SyncAction::Updated(_))),
            self.removals(),
        )
    }
}

/// Synchronizes a destination directory with a source directory.
///
/// ```no_run
/// use mcpack_core::TreeSync;
///
/// let report = TreeSync::new("forge/mcp/src/minecraft", "build/src/minecraft")
///     .files(["net/minecraft/client/Minecraft.java"])
///     .keep(["com/example/ExampleMod.java"])
///     .run()?;
/// println!("{}", report);
/// # Ok::<(), mcpack_core::SyncError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TreeSync {
    source: PathBuf,
    dest: PathBuf,
    files: Option<Vec<PathBuf>>,
    keep: Option<Vec<PathBuf>>,
}

impl TreeSync {
    /// Mirror every file under `source` into `dest`
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            files: None,
            keep: None,
        }
    }

    /// Restrict the mirror to these paths relative to the source root.
    ///
    /// The source tree is not walked when a list is given.
    pub fn files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.files
            .get_or_insert_with(Vec::new)
            .extend(files.into_iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    /// Never delete these files (relative to the destination root) or the directories holding them
    pub fn keep<I, P>(mut self, keep: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.keep
            .get_or_insert_with(Vec::new)
            .extend(keep.into_iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    /// Run the synchronization
    pub fn run(&self) -> Result<SyncReport, SyncError> {
        let keep = match &self.keep {
            Some(keep) => KeepSet::expand(keep)?,
            None => KeepSet::default(),
        };

        let mut sources = match &self.files {
            Some(files) => SourceSet::from_list(&self.source, files)?,
            None => SourceSet::walk(&self.source)?,
        };

        let mut report = SyncReport::default();
        self.reconcile(&mut sources, &keep, &mut report)?;
        self.complete(sources.files, &mut report)?;
        Ok(report)
    }

    /// Walk the destination: update stale files, drop unneeded ones.
    fn reconcile(
        &self,
        sources: &mut SourceSet,
        keep: &KeepSet,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        match fs::symlink_metadata(&self.dest) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(SyncError::Io {
                    path: self.dest.clone(),
                    source,
                })
            }
        }

        let mut entries = WalkDir::new(&self.dest).min_depth(1).into_iter();
        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if is_not_found(&err) => continue,
                Err(err) => return Err(walk_error(&self.dest, &HashMap::new(), err)),
            };
            let rel = relative_to(&self.dest, entry.path());

            if entry.file_type().is_dir() {
                if sources.dirs.contains(&rel) || keep.dirs.contains(&rel) {
                    continue;
                }
                entries.skip_current_dir();
                remove_entry(entry.path(), rel, true, report)?;
                continue;
            }

            match sources.files.remove(&rel) {
                Some(source_mtime) => {
                    let dest_mtime = modified_time(entry.path()).map_err(|source| SyncError::Io {
                        path: entry.path().to_path_buf(),
                        source,
                    })?;
                    if dest_mtime < source_mtime {
                        copy_file(&self.source.join(&rel), entry.path())?;
                        report.record(SyncAction::Updated(rel));
                    }
                }
                None if keep.files.contains(&rel) => {}
                None => remove_entry(entry.path(), rel, false, report)?,
            }
        }

        Ok(())
    }

    /// Copy every selected file the destination walk did not meet.
    fn complete(
        &self,
        remaining: BTreeMap<PathBuf, SystemTime>,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        for rel in remaining.into_keys() {
            let target = self.dest.join(&rel);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| SyncError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            copy_file(&self.source.join(&rel), &target)?;
            report.record(SyncAction::Created(rel));
        }
        Ok(())
    }
}

/// Mirror every file under `source` into `dest`
pub fn sync_tree(source: &Path, dest: &Path) -> Result<SyncReport, SyncError> {
    TreeSync::new(source, dest).run()
}

/// Files selected for the destination and the directories that hold them
#[derive(Debug, Default)]
struct SourceSet {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, SystemTime>,
}

impl SourceSet {
    fn from_list(root: &Path, files: &[PathBuf]) -> Result<Self, SyncError> {
        let mut set = Self::default();
        for file in files {
            let rel = clean_file_path(file)?;
            set.dirs
                .extend(parent_dirs(&rel).map(Path::to_path_buf));

            let full = root.join(&rel);
            let mtime = modified_time(&full).map_err(|e| source_error(&full, e))?;
            set.files.insert(rel, mtime);
        }
        Ok(set)
    }

    fn walk(root: &Path) -> Result<Self, SyncError> {
        let mut set = Self::default();
        // Canonical directory -> first relative path it was seen at.
        let mut encountered: HashMap<PathBuf, PathBuf> = HashMap::new();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|err| walk_error(root, &encountered, err))?;
            let rel = relative_to(root, entry.path());

            if entry.file_type().is_dir() {
                let real = fs::canonicalize(entry.path()).map_err(|e| source_error(entry.path(), e))?;
                if let Some(first) = encountered.get(&real) {
                    return Err(SyncError::Cycle {
                        real,
                        first: root.join(first),
                        second: root.join(&rel),
                    });
                }
                encountered.insert(real, rel.clone());
                if entry.depth() > 0 {
                    set.dirs.insert(rel);
                }
            } else {
                let mtime = entry
                    .metadata()
                    .map_err(|err| walk_error(root, &encountered, err))?
                    .modified()
                    .map_err(|e| source_error(entry.path(), e))?;
                set.files.insert(rel, mtime);
            }
        }

        Ok(set)
    }
}

/// Destination paths exempt from deletion
#[derive(Debug, Default)]
struct KeepSet {
    dirs: HashSet<PathBuf>,
    files: HashSet<PathBuf>,
}

impl KeepSet {
    fn expand(keep: &[PathBuf]) -> Result<Self, SyncError> {
        let mut set = Self::default();
        for path in keep {
            let rel = clean_file_path(path)?;
            set.dirs.extend(parent_dirs(&rel).map(Path::to_path_buf));
            set.files.insert(rel);
        }
        Ok(set)
    }
}

fn clean_file_path(path: &Path) -> Result<PathBuf, SyncError> {
    match clean_relative(path) {
        Some(rel) if !rel.as_os_str().is_empty() => Ok(rel),
        _ => Err(SyncError::InvalidPath {
            path: path.to_path_buf(),
        }),
    }
}

fn modified_time(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

fn source_error(path: &Path, source: io::Error) -> SyncError {
    if source.kind() == io::ErrorKind::NotFound {
        SyncError::SourceMissing {
            path: path.to_path_buf(),
        }
    } else {
        SyncError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn is_not_found(err: &walkdir::Error) -> bool {
    err.io_error()
        .map_or(false, |e| e.kind() == io::ErrorKind::NotFound)
}

fn walk_error(
    root: &Path,
    encountered: &HashMap<PathBuf, PathBuf>,
    err: walkdir::Error,
) -> SyncError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());

    if let Some(ancestor) = err.loop_ancestor() {
        let real = fs::canonicalize(ancestor).unwrap_or_else(|_| ancestor.to_path_buf());
        let first = encountered
            .get(&real)
            .map(|rel| root.join(rel))
            .unwrap_or_else(|| ancestor.to_path_buf());
        return SyncError::Cycle {
            real,
            first,
            second: path,
        };
    }

    match err.into_io_error() {
        Some(source) => source_error(&path, source),
        None => SyncError::Io {
            path,
            source: io::Error::new(io::ErrorKind::Other, "directory walk failed"),
        },
    }
}

/// Copy content, permissions and timestamps.
fn copy_file(src: &Path, dest: &Path) -> Result<(), SyncError> {
    let meta = fs::metadata(src).map_err(|e| source_error(src, e))?;
    fs::copy(src, dest).map_err(|source| SyncError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    filetime::set_file_times(dest, atime, mtime).map_err(|source| SyncError::Io {
        path: dest.to_path_buf(),
        source,
    })
}

fn remove_entry(
    full: &Path,
    rel: PathBuf,
    is_dir: bool,
    report: &mut SyncReport,
) -> Result<(), SyncError> {
    let result = if is_dir {
        fs::remove_dir_all(full)
    } else {
        fs::remove_file(full)
    };

    match result {
        Ok(()) if is_dir => report.record(SyncAction::RemovedDir(rel)),
        Ok(()) => report.record(SyncAction::RemovedFile(rel)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("Already absent: {}", path_to_string(&rel));
            report.record(SyncAction::TargetAlreadyAbsent(rel));
        }
        Err(source) => {
            return Err(SyncError::Io {
                path: full.to_path_buf(),
                source,
            })
        }
    }
    Ok(())
}
