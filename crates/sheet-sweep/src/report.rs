//! Run accounting: success/error counters and the error log.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{FileError, Stage, WalkError};

/// Report text recorded when the interactive folder picker is dismissed.
pub const CANCELLED_MESSAGE: &str = "Folder selection cancelled";

/// One failed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub path: PathBuf,
    pub stage: Stage,
    pub message: String,
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.message)
    }
}

/// A folder whose contents could not be listed. The walk skips it and
/// carries on with its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreadableFolder {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for UnreadableFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.message)
    }
}

/// Result of running the pipeline over one qualifying file.
#[derive(Debug)]
pub enum FileOutcome {
    /// All hooks completed; `saved` tells whether the workbook was persisted
    Processed { saved: bool },
    Failed(FileError),
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Processed { .. })
    }
}

/// How an entry point finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The folder tree was walked; inspect the report for per-file results
    Completed,
    /// The interactive picker was dismissed and nothing was visited
    Cancelled,
}

/// Accumulated results across every file the engine has visited.
///
/// Counters only ever grow. `success_count + error_count` is the number of
/// qualifying files visited since the engine was created or last reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    success_count: usize,
    error_count: usize,
    entries: Vec<ErrorEntry>,
    unreadable_folders: Vec<UnreadableFolder>,
    cancelled: bool,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Qualifying files visited so far.
    pub fn files_visited(&self) -> usize {
        self.success_count + self.error_count
    }

    /// Failed files in the order they were visited.
    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    /// Folders skipped because they could not be listed.
    pub fn unreadable_folders(&self) -> &[UnreadableFolder] {
        &self.unreadable_folders
    }

    /// Whether the most recent interactive run was cancelled at folder
    /// selection. Cleared by the next run.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Newline-joined `<path>:<message>` lines for failed files, then for
    /// unreadable folders.
    ///
    /// After a cancelled folder selection the report is the cancellation
    /// notice alone; counters and entries are kept for the next run.
    pub fn error_report(&self) -> String {
        if self.cancelled {
            return CANCELLED_MESSAGE.to_string();
        }
        self.entries
            .iter()
            .map(ToString::to_string)
            .chain(self.unreadable_folders.iter().map(ToString::to_string))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Account for one file.
    pub(crate) fn record(&mut self, path: &Path, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Processed { .. } => self.success_count += 1,
            FileOutcome::Failed(err) => {
                self.error_count += 1;
                self.entries.push(ErrorEntry {
                    path: path.to_path_buf(),
                    stage: err.stage(),
                    message: err.to_string(),
                });
            }
        }
    }

    /// Account for a folder the walk had to skip.
    pub(crate) fn record_unreadable(&mut self, err: &WalkError) {
        let message = match err {
            WalkError::List { source, .. } => source.to_string(),
            WalkError::FolderNotFound(_) => "folder not found".to_string(),
        };
        self.unreadable_folders.push(UnreadableFolder {
            path: err.path().to_path_buf(),
            message,
        });
    }

    pub(crate) fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_counts_each_outcome_once() {
        let mut report = RunReport::new();
        report.record(Path::new("a.xlsx"), &FileOutcome::Processed { saved: true });
        report.record(Path::new("b.xlsx"), &FileOutcome::Processed { saved: false });
        report.record(
            Path::new("c.xls"),
            &FileOutcome::Failed(FileError::Open("corrupt".into())),
        );

        assert_eq!(report.success_count(), 2);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.files_visited(), 3);
        assert_eq!(
            report.entries(),
            &[ErrorEntry {
                path: PathBuf::from("c.xls"),
                stage: Stage::Open,
                message: "corrupt".to_string(),
            }]
        );
    }

    #[test]
    fn error_report_joins_entries() {
        let mut report = RunReport::new();
        assert_eq!(report.error_report(), "");

        report.record(
            Path::new("x.xls"),
            &FileOutcome::Failed(FileError::Save("read-only".into())),
        );
        report.record(
            Path::new("y.xlsm"),
            &FileOutcome::Failed(FileError::PostHook("boom".into())),
        );
        assert_eq!(report.error_report(), "x.xls:read-only\ny.xlsm:boom");
    }

    #[test]
    fn cancellation_is_reported_without_counting() {
        let mut report = RunReport::new();
        report.set_cancelled(true);

        assert!(report.cancelled());
        assert_eq!(report.error_count(), 0);
        assert_eq!(report.error_report(), CANCELLED_MESSAGE);
    }

    #[test]
    fn cancellation_replaces_earlier_entries_in_the_report() {
        let mut report = RunReport::new();
        report.record(
            Path::new("c.xls"),
            &FileOutcome::Failed(FileError::Open("corrupt".into())),
        );
        report.set_cancelled(true);

        assert_eq!(report.error_report(), CANCELLED_MESSAGE);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.entries().len(), 1);

        report.set_cancelled(false);
        assert_eq!(report.error_report(), "c.xls:corrupt");
    }

    #[test]
    fn unreadable_folders_follow_file_entries() {
        let mut report = RunReport::new();
        report.record_unreadable(&WalkError::List {
            path: PathBuf::from("locked"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        });
        report.record(
            Path::new("x.xls"),
            &FileOutcome::Failed(FileError::Save("read-only".into())),
        );

        assert_eq!(report.error_count(), 1);
        assert_eq!(report.error_report(), "x.xls:read-only\nlocked:denied");
    }

    #[test]
    fn serializes_for_json_output() {
        let mut report = RunReport::new();
        report.record(
            Path::new("c.xls"),
            &FileOutcome::Failed(FileError::Open("corrupt".into())),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["error_count"], 1);
        assert_eq!(json["entries"][0]["stage"], "open");
        assert_eq!(json["entries"][0]["message"], "corrupt");
    }
}
