//! Folder traversal and run accounting across many files.

mod common;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use common::{new_log, opened, recording_hooks, touch, FakeApp};
use pretty_assertions::assert_eq;
use sheet_sweep::{
    Engine, EngineConfig, Filesystem, Folder, Listing, RunStatus, SweepError, WalkError,
};

fn no_save() -> EngineConfig {
    EngineConfig {
        save_on_success: false,
        ..Default::default()
    }
}

#[test]
fn mixed_folder_scenario() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["a.xlsx", "b.txt", "c.xls", "sub/d.xlsm"]);
    let log = new_log();
    let app = FakeApp::new(&log).fail_open("c.xls", "corrupt");

    let mut engine = Engine::new(app, recording_hooks(&log), EngineConfig::default());
    let status = engine.run_on_folder(dir.path(), true).unwrap();

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(opened(&log), vec!["a.xlsx", "c.xls", "d.xlsm"]);

    let report = engine.report();
    assert_eq!(report.success_count(), 2);
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.entries().len(), 1);
    assert_eq!(report.entries()[0].path, dir.path().join("c.xls"));
    assert_eq!(report.entries()[0].message, "corrupt");
    assert_eq!(
        report.error_report(),
        format!("{}:corrupt", dir.path().join("c.xls").display())
    );
}

fn deep_tree(root: &Path) {
    touch(
        root,
        &[
            "top.xlsx",
            "skip.csv",
            "l1/one.xls",
            "l1/notes.md",
            "l1/l2/two.xlsm",
            "l1/l2/l3/three.xlsx",
            "other/four.xlsx",
        ],
    );
}

#[test]
fn recursive_run_visits_every_level_once() {
    let dir = tempfile::tempdir().unwrap();
    deep_tree(dir.path());
    let log = new_log();

    let mut engine = Engine::new(FakeApp::new(&log), recording_hooks(&log), no_save());
    engine.run_on_folder(dir.path(), true).unwrap();

    let mut files = opened(&log);
    files.sort();
    assert_eq!(
        files,
        vec!["four.xlsx", "one.xls", "three.xlsx", "top.xlsx", "two.xlsm"]
    );
    assert_eq!(engine.report().files_visited(), 5);
}

#[test]
fn folder_files_come_before_subfolder_files() {
    let dir = tempfile::tempdir().unwrap();
    deep_tree(dir.path());
    let log = new_log();

    let mut engine = Engine::new(FakeApp::new(&log), recording_hooks(&log), no_save());
    engine.run_on_folder(dir.path(), true).unwrap();

    assert_eq!(
        opened(&log),
        vec!["top.xlsx", "one.xls", "two.xlsm", "three.xlsx", "four.xlsx"]
    );
}

#[test]
fn non_recursive_run_ignores_subfolders() {
    let dir = tempfile::tempdir().unwrap();
    deep_tree(dir.path());
    let log = new_log();

    let mut engine = Engine::new(FakeApp::new(&log), recording_hooks(&log), no_save());
    engine.run_on_folder(dir.path(), false).unwrap();

    assert_eq!(opened(&log), vec!["top.xlsx"]);
    assert_eq!(engine.report().files_visited(), 1);
}

#[test]
fn config_recursion_default_is_used_by_run() {
    let dir = tempfile::tempdir().unwrap();
    deep_tree(dir.path());
    let log = new_log();
    let config = EngineConfig {
        recursive: false,
        save_on_success: false,
    };

    let mut engine = Engine::new(FakeApp::new(&log), recording_hooks(&log), config);
    engine.run(dir.path()).unwrap();

    assert_eq!(opened(&log), vec!["top.xlsx"]);
}

#[test]
fn repeated_runs_produce_identical_counts() {
    let dir = tempfile::tempdir().unwrap();
    deep_tree(dir.path());
    touch(dir.path(), &["l1/broken.xlsx"]);
    let log = new_log();
    let app = FakeApp::new(&log).fail_open("broken.xlsx", "corrupt");

    let mut engine = Engine::new(app, recording_hooks(&log), no_save());
    engine.run(dir.path()).unwrap();
    let first = engine.reset_report();
    engine.run(dir.path()).unwrap();
    let second = engine.report().clone();

    assert_eq!(first.success_count(), 5);
    assert_eq!(first.error_count(), 1);
    assert_eq!(first, second);
}

#[test]
fn counts_accumulate_across_runs_without_reset() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), &["a.xlsx", "b.xls"]);
    let log = new_log();

    let mut engine = Engine::new(FakeApp::new(&log), recording_hooks(&log), no_save());
    engine.run(dir.path()).unwrap();
    engine.run(dir.path()).unwrap();

    assert_eq!(engine.report().success_count(), 4);
}

#[test]
fn missing_folder_is_a_run_level_error() {
    let dir = tempfile::tempdir().unwrap();
    let log = new_log();

    let mut engine = Engine::new(FakeApp::new(&log), recording_hooks(&log), no_save());
    let err = engine.run(dir.path().join("nope")).unwrap_err();

    assert!(matches!(err, SweepError::Walk(WalkError::FolderNotFound(_))));
    assert!(log.borrow().is_empty());
    assert_eq!(engine.report().files_visited(), 0);
}

/// In-memory tree whose `bad` folder cannot be listed.
struct MapFilesystem {
    tree: HashMap<PathBuf, Listing>,
}

impl Filesystem for MapFilesystem {
    fn resolve(&self, path: &Path) -> Result<Folder, WalkError> {
        if self.tree.contains_key(path) || path == Path::new("/root/bad") {
            Ok(Folder::new(path))
        } else {
            Err(WalkError::FolderNotFound(path.to_path_buf()))
        }
    }

    fn list(&self, folder: &Folder) -> Result<Listing, WalkError> {
        self.tree
            .get(folder.path())
            .cloned()
            .ok_or_else(|| WalkError::List {
                path: folder.path().to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
    }
}

#[test]
fn unreadable_folder_is_skipped_and_siblings_still_run() {
    let mut tree = HashMap::new();
    tree.insert(
        PathBuf::from("/root"),
        Listing {
            files: vec![PathBuf::from("/root/a.xlsx"), PathBuf::from("/root/b.doc")],
            folders: vec![Folder::new("/root/bad"), Folder::new("/root/later")],
        },
    );
    tree.insert(
        PathBuf::from("/root/later"),
        Listing {
            files: vec![PathBuf::from("/root/later/c.xlsx")],
            folders: vec![],
        },
    );
    let fs = MapFilesystem { tree };
    let log = new_log();

    let mut engine =
        Engine::with_filesystem(FakeApp::new(&log), fs, recording_hooks(&log), no_save());
    let folder = Folder::new("/root");
    let status = engine.run_on_folder_ref(&folder, true).unwrap();

    assert_eq!(status, RunStatus::Completed);
    assert_eq!(opened(&log), vec!["a.xlsx", "c.xlsx"]);

    let report = engine.report();
    assert_eq!(report.success_count(), 2);
    assert_eq!(report.error_count(), 0);
    assert_eq!(report.unreadable_folders().len(), 1);
    assert_eq!(report.unreadable_folders()[0].path, PathBuf::from("/root/bad"));
    assert!(report.error_report().starts_with("/root/bad:"));
}

#[test]
fn custom_filesystem_drives_the_walk() {
    let mut tree = HashMap::new();
    tree.insert(
        PathBuf::from("/root"),
        Listing {
            files: vec![PathBuf::from("/root/z.xlsx"), PathBuf::from("/root/a.xls")],
            folders: vec![],
        },
    );
    let log = new_log();

    let mut engine = Engine::with_filesystem(
        FakeApp::new(&log),
        MapFilesystem { tree },
        recording_hooks(&log),
        no_save(),
    );
    engine.run_on_folder("/root", true).unwrap();

    // Enumeration order is whatever the filesystem yields
    assert_eq!(opened(&log), vec!["z.xlsx", "a.xls"]);
}
