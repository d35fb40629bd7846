//! Workbook and worksheet handles issued by the bridge.

use std::path::{Path, PathBuf};

use excel_com_protocol::SheetRef;

/// A handle to an open workbook in the Excel COM bridge.
///
/// Not `Clone`: closing consumes the handle, so a workbook cannot be closed
/// twice.
#[derive(Debug)]
pub struct Workbook {
    handle: u64,
    path: PathBuf,
}

impl Workbook {
    pub(crate) fn new(handle: u64, path: &Path) -> Self {
        Self {
            handle,
            path: path.to_path_buf(),
        }
    }

    /// Get the internal handle ID.
    pub fn handle(&self) -> u64 {
        self.handle
    }

    /// The Linux path the workbook was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One worksheet of an open workbook, as listed at the time of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    index: u32,
    name: String,
}

impl Worksheet {
    pub(crate) fn new(index: u32, name: String) -> Self {
        Self { index, name }
    }

    /// 0-based tab position.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Worksheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&Worksheet> for SheetRef {
    fn from(sheet: &Worksheet) -> Self {
        SheetRef::Index(sheet.index)
    }
}
