//! Integration tests for tree synchronization
//!
//! Exercises the synchronizer against real temporary directories: first copy,
//! idempotent re-runs, pruning, keep lists, staleness, symlink cycles and
//! filesystem errors.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use filetime::FileTime;
use tempfile::TempDir;

use mcpack_core::{sync_tree, SyncAction, SyncError, TreeSync};

// ============================================================================
// Helper Functions
// ============================================================================

fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn set_mtime(path: &Path, unix_seconds: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(unix_seconds, 0)).unwrap();
}

fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

/// Sorted relative paths of every file and directory under `root`
fn tree(root: &Path) -> Vec<String> {
    let mut entries: Vec<String> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| {
            let entry = e.unwrap();
            let rel = entry.path().strip_prefix(root).unwrap();
            let mut name = rel.to_string_lossy().replace('\\', "/");
            if entry.file_type().is_dir() {
                name.push('/');
            }
            name
        })
        .collect();
    entries.sort();
    entries
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_initial_copy_then_noop() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    set_mtime(&write_file(src.path(), "a/x.txt", "x"), 10);
    set_mtime(&write_file(src.path(), "a/b/y.txt", "y"), 10);

    let report = sync_tree(src.path(), dest.path()).unwrap();
    assert_eq!(report.copies(), 2);
    assert_eq!(report.removals(), 0);
    assert_eq!(tree(dest.path()), vec!["a/", "a/b/", "a/b/y.txt", "a/x.txt"]);
    assert_eq!(fs::read_to_string(dest.path().join("a/x.txt")).unwrap(), "x");
    assert_eq!(fs::read_to_string(dest.path().join("a/b/y.txt")).unwrap(), "y");

    // Timestamps travel with the copy.
    assert_eq!(
        mtime(&dest.path().join("a/x.txt")),
        SystemTime::UNIX_EPOCH + Duration::from_secs(10)
    );

    let second = sync_tree(src.path(), dest.path()).unwrap();
    assert!(second.is_noop(), "second run did work: {:?}", second.actions);
}

#[test]
fn test_missing_destination_is_created() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_file(src.path(), "pkg/Mod.java", "class Mod {}");

    let target = dest.path().join("not/yet/here");
    let report = sync_tree(src.path(), &target).unwrap();
    assert_eq!(report.actions, vec![SyncAction::Created(PathBuf::from("pkg/Mod.java"))]);
    assert!(target.join("pkg/Mod.java").is_file());
}

#[test]
fn test_stale_file_is_pruned() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_file(src.path(), "a.txt", "a");
    write_file(dest.path(), "stale.txt", "old");
    write_file(dest.path(), "old/dir/deep.txt", "old");

    let report = sync_tree(src.path(), dest.path()).unwrap();
    assert!(report.actions.contains(&SyncAction::RemovedFile(PathBuf::from("stale.txt"))));
    assert!(report.actions.contains(&SyncAction::RemovedDir(PathBuf::from("old"))));
    assert_eq!(tree(dest.path()), vec!["a.txt"]);
}

#[test]
fn test_keep_entry_is_preserved() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_file(src.path(), "a.txt", "a");
    let kept = write_file(dest.path(), "keep.txt", "mine");
    set_mtime(&kept, 1_000);

    let report = TreeSync::new(src.path(), dest.path())
        .keep(["keep.txt"])
        .run()
        .unwrap();

    assert_eq!(report.removals(), 0);
    assert_eq!(fs::read_to_string(&kept).unwrap(), "mine");
    assert_eq!(mtime(&kept), SystemTime::UNIX_EPOCH + Duration::from_secs(1_000));
    assert_eq!(tree(dest.path()), vec!["a.txt", "keep.txt"]);
}

#[test]
fn test_keep_protects_ancestor_directories() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_file(src.path(), "net/minecraft/Block.java", "block");
    write_file(dest.path(), "com/example/ExampleMod.java", "mod");
    write_file(dest.path(), "com/example/Leftover.java", "gone");

    TreeSync::new(src.path(), dest.path())
        .keep(["com/example/ExampleMod.java"])
        .run()
        .unwrap();

    assert_eq!(
        tree(dest.path()),
        vec![
            "com/",
            "com/example/",
            "com/example/ExampleMod.java",
            "net/",
            "net/minecraft/",
            "net/minecraft/Block.java",
        ]
    );
}

#[test]
fn test_keep_entry_naming_a_directory_does_not_protect_it() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_file(src.path(), "a.txt", "a");
    write_file(dest.path(), "assets/logo.png", "png");

    let report = TreeSync::new(src.path(), dest.path())
        .keep(["assets"])
        .run()
        .unwrap();

    assert!(report.actions.contains(&SyncAction::RemovedDir(PathBuf::from("assets"))));
    assert_eq!(tree(dest.path()), vec!["a.txt"]);
}

// ============================================================================
// Staleness
// ============================================================================

#[test]
fn test_older_destination_is_overwritten() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    set_mtime(&write_file(src.path(), "f.txt", "new"), 2_000);
    set_mtime(&write_file(dest.path(), "f.txt", "old"), 1_000);

    let report = sync_tree(src.path(), dest.path()).unwrap();
    assert_eq!(report.actions, vec![SyncAction::Updated(PathBuf::from("f.txt"))]);
    assert_eq!(fs::read_to_string(dest.path().join("f.txt")).unwrap(), "new");
}

#[test]
fn test_newer_or_equal_destination_is_left_alone() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    set_mtime(&write_file(src.path(), "newer.txt", "src"), 1_000);
    set_mtime(&write_file(dest.path(), "newer.txt", "dest"), 2_000);
    set_mtime(&write_file(src.path(), "equal.txt", "src"), 1_500);
    set_mtime(&write_file(dest.path(), "equal.txt", "dest"), 1_500);

    let report = sync_tree(src.path(), dest.path()).unwrap();
    assert!(report.is_noop());
    assert_eq!(fs::read_to_string(dest.path().join("newer.txt")).unwrap(), "dest");
    assert_eq!(fs::read_to_string(dest.path().join("equal.txt")).unwrap(), "dest");
}

// ============================================================================
// Explicit file lists
// ============================================================================

#[test]
fn test_explicit_list_limits_the_mirror() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_file(src.path(), "pkg/A.java", "a");
    write_file(src.path(), "pkg/B.java", "b");
    write_file(src.path(), "notes.txt", "skip");
    write_file(dest.path(), "notes.txt", "previous");

    let report = TreeSync::new(src.path(), dest.path())
        .files(["pkg/A.java", "./pkg/B.java"])
        .run()
        .unwrap();

    assert_eq!(report.copies(), 2);
    assert!(report.actions.contains(&SyncAction::RemovedFile(PathBuf::from("notes.txt"))));
    assert_eq!(tree(dest.path()), vec!["pkg/", "pkg/A.java", "pkg/B.java"]);
}

#[test]
fn test_explicit_missing_file_is_fatal() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_file(src.path(), "present.txt", "here");

    let err = TreeSync::new(src.path(), dest.path())
        .files(["present.txt", "absent.txt"])
        .run()
        .unwrap_err();

    match err {
        SyncError::SourceMissing { path } => assert!(path.ends_with("absent.txt")),
        other => panic!("expected SourceMissing, got {other}"),
    }
}

#[test]
fn test_escaping_paths_are_rejected() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();

    let err = TreeSync::new(src.path(), dest.path())
        .keep(["../outside.txt"])
        .run()
        .unwrap_err();
    assert!(matches!(err, SyncError::InvalidPath { .. }));
}

#[test]
fn test_missing_source_root_is_fatal() {
    let dest = TempDir::new().unwrap();
    let err = sync_tree(&dest.path().join("nope"), dest.path()).unwrap_err();
    assert!(matches!(err, SyncError::SourceMissing { .. }));
}

// ============================================================================
// Symlinks
// ============================================================================

#[cfg(unix)]
#[test]
fn test_symlink_to_ancestor_is_a_cycle() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_file(src.path(), "a/x.txt", "x");
    std::os::unix::fs::symlink(src.path(), src.path().join("a/loop")).unwrap();

    let err = sync_tree(src.path(), dest.path()).unwrap_err();
    assert!(matches!(err, SyncError::Cycle { .. }), "unexpected error: {err}");
}

#[cfg(unix)]
#[test]
fn test_directory_reached_twice_is_a_cycle() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_file(src.path(), "real/x.txt", "x");
    std::os::unix::fs::symlink(src.path().join("real"), src.path().join("alias")).unwrap();

    match sync_tree(src.path(), dest.path()).unwrap_err() {
        SyncError::Cycle { first, second, .. } => assert_ne!(first, second),
        other => panic!("expected Cycle, got {other}"),
    }
}

#[cfg(unix)]
#[test]
fn test_symlinked_file_is_copied_as_content() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    let target = write_file(outside.path(), "shared.txt", "shared");
    std::os::unix::fs::symlink(&target, src.path().join("link.txt")).unwrap();

    sync_tree(src.path(), dest.path()).unwrap();

    let copied = dest.path().join("link.txt");
    assert!(!fs::symlink_metadata(&copied).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_to_string(copied).unwrap(), "shared");
}

// ============================================================================
// Filesystem errors
// ============================================================================

#[cfg(unix)]
#[test]
fn test_dangling_destination_link_is_an_error() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    write_file(src.path(), "f.txt", "content");
    let target = outside.path().join("escaped.txt");
    std::os::unix::fs::symlink(&target, dest.path().join("f.txt")).unwrap();

    match sync_tree(src.path(), dest.path()).unwrap_err() {
        SyncError::Io { path, .. } => assert_eq!(path, dest.path().join("f.txt")),
        other => panic!("expected Io, got {other}"),
    }
    assert!(!target.exists());
}

#[cfg(unix)]
#[test]
fn test_failed_removal_propagates() {
    use std::os::unix::fs::PermissionsExt;

    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    write_file(src.path(), "pkg/Wanted.java", "wanted");
    let locked = dest.path().join("pkg");
    let unwanted = write_file(dest.path(), "pkg/Unwanted.java", "unwanted");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // Permission bits do not bind a privileged user.
    let canary = locked.join(".writable");
    if fs::write(&canary, "").is_ok() {
        fs::remove_file(&canary).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = TreeSync::new(src.path(), dest.path())
        .files(["pkg/Wanted.java"])
        .run();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    match result.unwrap_err() {
        SyncError::Io { path, .. } => assert_eq!(path, unwanted),
        other => panic!("expected Io, got {other}"),
    }
    assert_eq!(fs::read_to_string(&unwanted).unwrap(), "unwanted");
}
