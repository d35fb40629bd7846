//! The sweep engine: entry points, the per-file pipeline and the
//! application lifecycle.

use std::path::Path;

use serde::Deserialize;

use crate::app::SpreadsheetApp;
use crate::error::{FileError, Result, SweepError};
use crate::filter::is_processable;
use crate::fs::{walk, Filesystem, Folder, StdFilesystem};
use crate::hooks::{HookContext, Hooks};
use crate::picker::FolderPicker;
use crate::report::{FileOutcome, RunReport, RunStatus};

/// Settings fixed for the lifetime of an [`Engine`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Save each workbook whose hooks all succeeded (default: true)
    pub save_on_success: bool,
    /// Descend into subfolders when the entry point is not told otherwise
    /// (default: true)
    pub recursive: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_on_success: true,
            recursive: true,
        }
    }
}

/// Runs [`Hooks`] over every spreadsheet in a folder tree through one shared
/// [`SpreadsheetApp`].
///
/// The application is owned by the engine but never released implicitly;
/// call [`Engine::quit`] once all runs are done. Results accumulate in the
/// [`RunReport`] across runs until [`Engine::reset_report`].
pub struct Engine<A: SpreadsheetApp, F: Filesystem = StdFilesystem> {
    app: Option<A>,
    fs: F,
    hooks: Hooks<A>,
    config: EngineConfig,
    report: RunReport,
}

impl<A: SpreadsheetApp> Engine<A> {
    /// Create an engine over the local filesystem.
    pub fn new(app: A, hooks: Hooks<A>, config: EngineConfig) -> Self {
        Self::with_filesystem(app, StdFilesystem, hooks, config)
    }
}

impl<A: SpreadsheetApp, F: Filesystem> Engine<A, F> {
    /// Create an engine over a custom filesystem collaborator.
    pub fn with_filesystem(app: A, fs: F, hooks: Hooks<A>, config: EngineConfig) -> Self {
        Self {
            app: Some(app),
            fs,
            hooks,
            config,
            report: RunReport::new(),
        }
    }

    /// Settings this engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Results so far.
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Start a fresh report, returning the previous one.
    pub fn reset_report(&mut self) -> RunReport {
        std::mem::take(&mut self.report)
    }

    /// The live application, or `None` after [`Engine::quit`].
    pub fn app_mut(&mut self) -> Option<&mut A> {
        self.app.as_mut()
    }

    /// Sweep the folder at `path`, using the configured recursion default.
    pub fn run(&mut self, path: impl AsRef<Path>) -> Result<RunStatus> {
        let recursive = self.config.recursive;
        self.run_on_folder(path, recursive)
    }

    /// Sweep the folder at `path`.
    pub fn run_on_folder(&mut self, path: impl AsRef<Path>, recursive: bool) -> Result<RunStatus> {
        self.report.set_cancelled(false);
        let folder = self.fs.resolve(path.as_ref())?;
        self.run_on_folder_ref(&folder, recursive)
    }

    /// Sweep an already-resolved folder.
    ///
    /// Every qualifying file is attempted no matter how many earlier files
    /// failed. Folders that cannot be listed are skipped and recorded in the
    /// report; the walk continues with their siblings.
    pub fn run_on_folder_ref(&mut self, folder: &Folder, recursive: bool) -> Result<RunStatus> {
        let Self {
            app,
            fs,
            hooks,
            config,
            report,
        } = self;
        let app = app.as_mut().ok_or(SweepError::ApplicationReleased)?;
        let save = config.save_on_success;
        report.set_cancelled(false);

        let before = (report.success_count(), report.error_count());
        let skipped = walk(&*fs, folder, recursive, &mut |path: &Path| {
            if !is_processable(path) {
                tracing::debug!("Skipping '{}'", path.display());
                return;
            }
            let outcome = process(app, hooks, save, report, path);
            report.record(path, &outcome);
        });
        for err in &skipped {
            report.record_unreadable(err);
        }

        tracing::info!(
            "Swept '{}': {} succeeded, {} failed, {} folder(s) skipped",
            folder.path().display(),
            report.success_count() - before.0,
            report.error_count() - before.1,
            skipped.len()
        );
        Ok(RunStatus::Completed)
    }

    /// Ask `picker` for a folder and sweep it.
    ///
    /// A dismissed picker visits nothing and counts nothing; the report is
    /// flagged as cancelled instead.
    pub fn run_interactive<P>(&mut self, picker: &mut P, recursive: bool) -> Result<RunStatus>
    where
        P: FolderPicker + ?Sized,
    {
        if self.app.is_none() {
            return Err(SweepError::ApplicationReleased);
        }

        match picker.pick_folder() {
            Some(path) => self.run_on_folder(path, recursive),
            None => {
                tracing::info!("Folder selection cancelled");
                self.report.set_cancelled(true);
                Ok(RunStatus::Cancelled)
            }
        }
    }

    /// Run the pipeline over a single file and count the result.
    ///
    /// The extension filter is not applied here.
    pub fn process_file(&mut self, path: impl AsRef<Path>) -> Result<FileOutcome> {
        let path = path.as_ref();
        let app = self.app.as_mut().ok_or(SweepError::ApplicationReleased)?;
        let outcome = process(
            app,
            &mut self.hooks,
            self.config.save_on_success,
            &self.report,
            path,
        );
        self.report.record(path, &outcome);
        Ok(outcome)
    }

    /// Release the spreadsheet application. Later calls do nothing.
    pub fn quit(&mut self) -> std::result::Result<(), A::Error> {
        match self.app.take() {
            Some(mut app) => {
                tracing::info!("Releasing spreadsheet application");
                app.quit()
            }
            None => Ok(()),
        }
    }
}

/// Open, run the hooks, optionally save, and always close.
fn process<A: SpreadsheetApp>(
    app: &mut A,
    hooks: &mut Hooks<A>,
    save: bool,
    report: &RunReport,
    path: &Path,
) -> FileOutcome {
    let workbook = match app.open_workbook(path) {
        Ok(workbook) => workbook,
        Err(e) => return failed(path, FileError::Open(Box::new(e))),
    };

    let result = run_stages(app, hooks, save, report, path, &workbook);
    let closed = app.close_workbook(workbook);

    match (result, closed) {
        (Ok(saved), Ok(())) => {
            tracing::info!("Processed '{}'", path.display());
            FileOutcome::Processed { saved }
        }
        (Ok(_), Err(e)) => failed(path, FileError::Close(Box::new(e))),
        (Err(err), Ok(())) => failed(path, err),
        (Err(err), Err(close_err)) => {
            tracing::warn!(
                "Failed to close '{}' after error: {close_err}",
                path.display()
            );
            failed(path, err)
        }
    }
}

/// Steps between open and close. Returns whether the workbook was saved.
fn run_stages<A: SpreadsheetApp>(
    app: &mut A,
    hooks: &mut Hooks<A>,
    save: bool,
    report: &RunReport,
    path: &Path,
    workbook: &A::Workbook,
) -> std::result::Result<bool, FileError> {
    let mut ctx = HookContext::new(app, path, report);

    (hooks.pre)(&mut ctx, workbook).map_err(|e| FileError::PreHook(e.into()))?;

    let sheets = ctx
        .app()
        .worksheets(workbook)
        .map_err(|e| FileError::Worksheets(Box::new(e)))?;
    for (index, sheet) in sheets.iter().enumerate() {
        (hooks.per_sheet)(&mut ctx, workbook, sheet).map_err(|e| FileError::SheetHook {
            index,
            source: e.into(),
        })?;
    }

    (hooks.post)(&mut ctx, workbook).map_err(|e| FileError::PostHook(e.into()))?;

    if save {
        ctx.app()
            .save_workbook(workbook)
            .map_err(|e| FileError::Save(Box::new(e)))?;
    }

    Ok(save)
}

fn failed(path: &Path, err: FileError) -> FileOutcome {
    tracing::warn!("Failed to process '{}' ({}): {err}", path.display(), err.stage());
    FileOutcome::Failed(err)
}
