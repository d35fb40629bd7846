//! Filesystem collaborator and the folder traversal built on it.

use std::path::{Path, PathBuf};

use crate::error::WalkError;

/// A resolved folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Folder {
    path: PathBuf,
}

impl Folder {
    /// Wrap a path already known to be a directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Direct contents of one folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Regular files directly inside the folder
    pub files: Vec<PathBuf>,
    /// Subfolders directly inside the folder
    pub folders: Vec<Folder>,
}

/// Enumerates folders. Only direct children are listed; recursion is the
/// caller's job.
pub trait Filesystem {
    /// Turn a path into a folder reference, failing if it is not a directory.
    fn resolve(&self, path: &Path) -> Result<Folder, WalkError>;

    /// List the direct files and subfolders of `folder`.
    fn list(&self, folder: &Folder) -> Result<Listing, WalkError>;
}

/// [`Filesystem`] backed by `std::fs`.
///
/// Symlinks are followed. Entries are sorted by name so that repeated runs over
/// the same tree visit files in the same order.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFilesystem;

impl Filesystem for StdFilesystem {
    fn resolve(&self, path: &Path) -> Result<Folder, WalkError> {
        if path.is_dir() {
            Ok(Folder::new(path))
        } else {
            Err(WalkError::FolderNotFound(path.to_path_buf()))
        }
    }

    fn list(&self, folder: &Folder) -> Result<Listing, WalkError> {
        let list_err = |source: std::io::Error| WalkError::List {
            path: folder.path().to_path_buf(),
            source,
        };

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(folder.path()).map_err(list_err)? {
            entries.push(entry.map_err(list_err)?.path());
        }
        entries.sort();

        let mut listing = Listing::default();
        for path in entries {
            match std::fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => listing.folders.push(Folder::new(path)),
                Ok(meta) if meta.is_file() => listing.files.push(path),
                Ok(_) => {}
                Err(e) => {
                    // Dangling symlinks and entries removed mid-listing
                    tracing::debug!("Skipping unreadable entry '{}': {e}", path.display());
                }
            }
        }

        Ok(listing)
    }
}

/// Visit every regular file under `folder` in pre-order.
///
/// The folder's own files are visited first, then each subfolder is walked with
/// the same `recursive` flag. With `recursive == false` only direct files are
/// visited. There is no depth limit and no cycle detection.
///
/// A folder that cannot be listed is skipped and the walk moves on to its
/// siblings. The returned errors name every skipped folder, in walk order.
pub fn walk<F, V>(fs: &F, folder: &Folder, recursive: bool, visit: &mut V) -> Vec<WalkError>
where
    F: Filesystem + ?Sized,
    V: FnMut(&Path),
{
    let mut skipped = Vec::new();
    walk_into(fs, folder, recursive, visit, &mut skipped);
    skipped
}

fn walk_into<F, V>(
    fs: &F,
    folder: &Folder,
    recursive: bool,
    visit: &mut V,
    skipped: &mut Vec<WalkError>,
) where
    F: Filesystem + ?Sized,
    V: FnMut(&Path),
{
    tracing::debug!("Visiting folder '{}'", folder.path().display());
    let listing = match fs.list(folder) {
        Ok(listing) => listing,
        Err(e) => {
            tracing::warn!("{e}");
            skipped.push(e);
            return;
        }
    };

    for file in &listing.files {
        visit(file);
    }

    if recursive {
        for sub in &listing.folders {
            walk_into(fs, sub, recursive, visit, skipped);
        }
    }
}
