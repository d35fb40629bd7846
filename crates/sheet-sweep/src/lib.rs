//! # sheet-sweep
//!
//! Batch-process every spreadsheet under a folder through three user-supplied
//! hooks, one file at a time, through a single long-lived spreadsheet
//! application.
//!
//! For each `.xls`, `.xlsx` and `.xlsm` file the engine opens the workbook,
//! runs the pre-hook, the per-sheet hook for every worksheet, then the
//! post-hook, optionally saves, and always closes the workbook. A failure in
//! any of those steps is recorded against that file and the sweep moves on.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sheet_sweep::{Engine, EngineConfig, Hooks};
//!
//! let hooks = Hooks::new().post(|ctx, _wb| {
//!     tracing::info!("done with {}", ctx.path().display());
//!     Ok(())
//! });
//!
//! let mut engine = Engine::new(app, hooks, EngineConfig::default());
//! engine.run("/data/reports")?;
//! println!("{} ok, {} failed", engine.report().success_count(), engine.report().error_count());
//! println!("{}", engine.report().error_report());
//! engine.quit()?;
//! ```

pub mod app;
pub mod engine;
pub mod error;
pub mod filter;
pub mod fs;
pub mod hooks;
pub mod picker;
pub mod report;

pub use app::SpreadsheetApp;
pub use engine::{Engine, EngineConfig};
pub use error::{BoxError, FileError, Result, Stage, SweepError, WalkError};
pub use filter::{is_processable, SPREADSHEET_EXTENSIONS};
pub use fs::{walk, Filesystem, Folder, Listing, StdFilesystem};
pub use hooks::{HookContext, HookResult, Hooks};
pub use picker::FolderPicker;
pub use report::{
    ErrorEntry, FileOutcome, RunReport, RunStatus, UnreadableFolder, CANCELLED_MESSAGE,
};
