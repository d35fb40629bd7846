//! The spreadsheet application collaborator.

use std::path::Path;

/// A long-lived spreadsheet application that opens, saves and closes workbooks.
///
/// One instance serves every file of a run, strictly one workbook at a time.
/// Implementations are not expected to be safe for concurrent use.
pub trait SpreadsheetApp {
    /// Handle to an open workbook
    type Workbook;

    /// Handle to one worksheet of an open workbook
    type Worksheet;

    /// Error raised by any application call
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open the workbook stored at `path`.
    fn open_workbook(&mut self, path: &Path) -> Result<Self::Workbook, Self::Error>;

    /// Worksheets of `workbook`, in the order the application exposes them.
    fn worksheets(&mut self, workbook: &Self::Workbook)
        -> Result<Vec<Self::Worksheet>, Self::Error>;

    /// Persist `workbook` in place, keeping its original format.
    fn save_workbook(&mut self, workbook: &Self::Workbook) -> Result<(), Self::Error>;

    /// Close `workbook` without saving.
    fn close_workbook(&mut self, workbook: Self::Workbook) -> Result<(), Self::Error>;

    /// Release the application itself.
    fn quit(&mut self) -> Result<(), Self::Error>;
}
