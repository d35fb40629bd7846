//! Spreadsheet file classification by extension.

use std::path::Path;

/// Extensions picked up by a sweep: legacy BIFF, OOXML and macro-enabled OOXML.
pub const SPREADSHEET_EXTENSIONS: [&str; 3] = ["xls", "xlsx", "xlsm"];

/// Whether the host filesystem treats names case-insensitively.
const CASE_INSENSITIVE: bool = cfg!(any(windows, target_os = "macos"));

/// Returns true if `path` names a spreadsheet the sweep should process.
///
/// Only the extension is inspected; callers pass regular files. Matching is
/// case-insensitive on Windows and macOS and exact elsewhere.
pub fn is_processable(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };

    SPREADSHEET_EXTENSIONS.iter().any(|allowed| {
        if CASE_INSENSITIVE {
            allowed.eq_ignore_ascii_case(ext)
        } else {
            *allowed == ext
        }
    })
}
