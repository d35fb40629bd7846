//! Common utilities for engine integration tests.
//!
//! `FakeApp` stands in for the spreadsheet application. Every call, and every
//! hook invocation made through [`recording_hooks`], is appended to a shared
//! [`CallLog`] so tests can assert on the exact sequence after the engine has
//! taken ownership of the app (or released it).

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use sheet_sweep::{Hooks, SpreadsheetApp};

/// One observable interaction, keyed by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(String),
    Worksheets(String),
    Pre(String),
    Sheet(String, String),
    Post(String),
    Save(String),
    Close(String),
    Quit,
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeError(pub String);

#[derive(Debug)]
pub struct FakeWorkbook {
    pub name: String,
}

/// Scripted spreadsheet application.
pub struct FakeApp {
    log: CallLog,
    open_errors: HashMap<String, String>,
    save_errors: HashMap<String, String>,
    close_errors: HashMap<String, String>,
    sheets: HashMap<String, Vec<String>>,
    open_now: Option<String>,
}

impl FakeApp {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Rc::clone(log),
            open_errors: HashMap::new(),
            save_errors: HashMap::new(),
            close_errors: HashMap::new(),
            sheets: HashMap::new(),
            open_now: None,
        }
    }

    pub fn fail_open(mut self, name: &str, message: &str) -> Self {
        self.open_errors.insert(name.into(), message.into());
        self
    }

    pub fn fail_save(mut self, name: &str, message: &str) -> Self {
        self.save_errors.insert(name.into(), message.into());
        self
    }

    pub fn fail_close(mut self, name: &str, message: &str) -> Self {
        self.close_errors.insert(name.into(), message.into());
        self
    }

    pub fn with_sheets(mut self, name: &str, sheets: &[&str]) -> Self {
        self.sheets
            .insert(name.into(), sheets.iter().map(|s| s.to_string()).collect());
        self
    }

    fn push(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

impl SpreadsheetApp for FakeApp {
    type Workbook = FakeWorkbook;
    type Worksheet = String;
    type Error = FakeError;

    fn open_workbook(&mut self, path: &Path) -> Result<FakeWorkbook, FakeError> {
        let name = file_name(path);
        self.push(Call::Open(name.clone()));
        assert!(
            self.open_now.is_none(),
            "opened {name} while {:?} is still open",
            self.open_now
        );
        if let Some(message) = self.open_errors.get(&name) {
            return Err(FakeError(message.clone()));
        }
        self.open_now = Some(name.clone());
        Ok(FakeWorkbook { name })
    }

    fn worksheets(&mut self, workbook: &FakeWorkbook) -> Result<Vec<String>, FakeError> {
        self.push(Call::Worksheets(workbook.name.clone()));
        Ok(self
            .sheets
            .get(&workbook.name)
            .cloned()
            .unwrap_or_else(|| vec!["Sheet1".to_string()]))
    }

    fn save_workbook(&mut self, workbook: &FakeWorkbook) -> Result<(), FakeError> {
        self.push(Call::Save(workbook.name.clone()));
        match self.save_errors.get(&workbook.name) {
            Some(message) => Err(FakeError(message.clone())),
            None => Ok(()),
        }
    }

    fn close_workbook(&mut self, workbook: FakeWorkbook) -> Result<(), FakeError> {
        self.push(Call::Close(workbook.name.clone()));
        self.open_now = None;
        match self.close_errors.get(&workbook.name) {
            Some(message) => Err(FakeError(message.clone())),
            None => Ok(()),
        }
    }

    fn quit(&mut self) -> Result<(), FakeError> {
        self.push(Call::Quit);
        Ok(())
    }
}

/// Hooks that record every invocation in `log`.
pub fn recording_hooks(log: &CallLog) -> Hooks<FakeApp> {
    let (pre_log, sheet_log, post_log) = (Rc::clone(log), Rc::clone(log), Rc::clone(log));
    Hooks::<FakeApp>::new()
        .pre(move |ctx, _wb| {
            pre_log.borrow_mut().push(Call::Pre(file_name(ctx.path())));
            Ok(())
        })
        .per_sheet(move |ctx, _wb, sheet| {
            sheet_log
                .borrow_mut()
                .push(Call::Sheet(file_name(ctx.path()), sheet.clone()));
            Ok(())
        })
        .post(move |ctx, _wb| {
            post_log.borrow_mut().push(Call::Post(file_name(ctx.path())));
            Ok(())
        })
}

pub fn new_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Create empty files (and their parent folders) under `root`.
pub fn touch(root: &Path, files: &[&str]) {
    for file in files {
        let path = root.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }
}

/// Names of files passed to `open_workbook`, in order.
pub fn opened(log: &CallLog) -> Vec<String> {
    log.borrow()
        .iter()
        .filter_map(|call| match call {
            Call::Open(name) => Some(name.clone()),
            _ => None,
        })
        .collect()
}

pub fn count(log: &CallLog, wanted: &Call) -> usize {
    log.borrow().iter().filter(|call| *call == wanted).count()
}
