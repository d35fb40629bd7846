//! Interactive folder selection.

use std::path::PathBuf;

/// Asks the user for a folder to sweep.
pub trait FolderPicker {
    /// The chosen folder, or `None` if the user cancelled.
    fn pick_folder(&mut self) -> Option<PathBuf>;
}

impl<F> FolderPicker for F
where
    F: FnMut() -> Option<PathBuf>,
{
    fn pick_folder(&mut self) -> Option<PathBuf> {
        self()
    }
}
