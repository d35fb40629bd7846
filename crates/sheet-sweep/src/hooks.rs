//! User-supplied processing stages.

use std::path::Path;

use crate::app::SpreadsheetApp;
use crate::report::RunReport;

/// Return type of every hook. The error's display text is what ends up in
/// the run's error log.
pub type HookResult = anyhow::Result<()>;

type WorkbookHook<A> =
    Box<dyn FnMut(&mut HookContext<'_, A>, &<A as SpreadsheetApp>::Workbook) -> HookResult>;

type SheetHook<A> = Box<
    dyn FnMut(
        &mut HookContext<'_, A>,
        &<A as SpreadsheetApp>::Workbook,
        &<A as SpreadsheetApp>::Worksheet,
    ) -> HookResult,
>;

/// What a hook can see while a file is being processed.
pub struct HookContext<'a, A> {
    app: &'a mut A,
    path: &'a Path,
    report: &'a RunReport,
}

impl<'a, A> HookContext<'a, A> {
    pub(crate) fn new(app: &'a mut A, path: &'a Path, report: &'a RunReport) -> Self {
        Self { app, path, report }
    }

    /// The shared spreadsheet application, for backend-specific calls.
    pub fn app(&mut self) -> &mut A {
        self.app
    }

    /// Path of the file being processed.
    pub fn path(&self) -> &Path {
        self.path
    }

    /// Results accumulated before this file.
    pub fn report(&self) -> &RunReport {
        self.report
    }
}

/// The three processing stages run against every opened workbook.
///
/// Each stage defaults to a no-op.
///
/// ```rust,ignore
/// let hooks = Hooks::new()
///     .per_sheet(|ctx, _wb, sheet| {
///         tracing::info!("{}: {sheet}", ctx.path().display());
///         Ok(())
///     });
/// ```
pub struct Hooks<A: SpreadsheetApp> {
    pub(crate) pre: WorkbookHook<A>,
    pub(crate) per_sheet: SheetHook<A>,
    pub(crate) post: WorkbookHook<A>,
}

impl<A: SpreadsheetApp> Hooks<A> {
    pub fn new() -> Self {
        Self {
            pre: Box::new(|_, _| Ok(())),
            per_sheet: Box::new(|_, _, _| Ok(())),
            post: Box::new(|_, _| Ok(())),
        }
    }

    /// Run once per workbook, before any worksheet is visited.
    pub fn pre<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut HookContext<'_, A>, &A::Workbook) -> HookResult + 'static,
    {
        self.pre = Box::new(hook);
        self
    }

    /// Run for each worksheet in order. An error skips the remaining sheets.
    pub fn per_sheet<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut HookContext<'_, A>, &A::Workbook, &A::Worksheet) -> HookResult + 'static,
    {
        self.per_sheet = Box::new(hook);
        self
    }

    /// Run once per workbook, after every worksheet was visited.
    pub fn post<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut HookContext<'_, A>, &A::Workbook) -> HookResult + 'static,
    {
        self.post = Box::new(hook);
        self
    }
}

impl<A: SpreadsheetApp> Default for Hooks<A> {
    fn default() -> Self {
        Self::new()
    }
}
