//! Error types for sheet-sweep

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Result type alias using [`SweepError`]
pub type Result<T> = std::result::Result<T, SweepError>;

/// Boxed error captured from a collaborator or a hook.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Run-level errors returned by the entry points.
///
/// Failures while processing an individual file never show up here; they are
/// recorded in the [`RunReport`](crate::RunReport) instead.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The folder tree could not be resolved or enumerated
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// `quit` was already called on this engine
    #[error("Spreadsheet application has already been released")]
    ApplicationReleased,
}

/// Errors from the filesystem collaborator.
#[derive(Debug, Error)]
pub enum WalkError {
    /// Path does not exist or is not a directory
    #[error("Folder not found: {}", .0.display())]
    FolderNotFound(PathBuf),

    /// Directory exists but its entries could not be read
    #[error("Failed to list folder '{}': {source}", .path.display())]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WalkError {
    /// The folder the error is about.
    pub fn path(&self) -> &Path {
        match self {
            WalkError::FolderNotFound(path) => path,
            WalkError::List { path, .. } => path,
        }
    }
}

/// The pipeline step at which a file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Open,
    PreHook,
    Worksheets,
    SheetHook,
    PostHook,
    Save,
    Close,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Open => "open",
            Stage::PreHook => "pre-hook",
            Stage::Worksheets => "worksheets",
            Stage::SheetHook => "sheet hook",
            Stage::PostHook => "post-hook",
            Stage::Save => "save",
            Stage::Close => "close",
        };
        f.write_str(name)
    }
}

/// A file-level failure.
///
/// Displays as the underlying message only, so the error log carries exactly
/// what the spreadsheet engine or the hook reported.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("{0}")]
    Open(#[source] BoxError),

    #[error("{0}")]
    PreHook(#[source] BoxError),

    #[error("{0}")]
    Worksheets(#[source] BoxError),

    /// Raised by the per-sheet hook on the sheet at `index` (0-based)
    #[error("{source}")]
    SheetHook {
        index: usize,
        #[source]
        source: BoxError,
    },

    #[error("{0}")]
    PostHook(#[source] BoxError),

    #[error("{0}")]
    Save(#[source] BoxError),

    #[error("{0}")]
    Close(#[source] BoxError),
}

impl FileError {
    /// The step that raised this error.
    pub fn stage(&self) -> Stage {
        match self {
            FileError::Open(_) => Stage::Open,
            FileError::PreHook(_) => Stage::PreHook,
            FileError::Worksheets(_) => Stage::Worksheets,
            FileError::SheetHook { .. } => Stage::SheetHook,
            FileError::PostHook(_) => Stage::PostHook,
            FileError::Save(_) => Stage::Save,
            FileError::Close(_) => Stage::Close,
        }
    }
}
