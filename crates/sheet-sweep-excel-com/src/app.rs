//! [`SpreadsheetApp`] implementation for the Excel bridge.

use std::path::Path;

use sheet_sweep::SpreadsheetApp;

use crate::bridge::{BridgeError, ExcelBridge};
use crate::workbook::{Workbook, Worksheet};

impl SpreadsheetApp for ExcelBridge {
    type Workbook = Workbook;
    type Worksheet = Worksheet;
    type Error = BridgeError;

    fn open_workbook(&mut self, path: &Path) -> Result<Workbook, BridgeError> {
        self.open(path)
    }

    fn worksheets(&mut self, workbook: &Workbook) -> Result<Vec<Worksheet>, BridgeError> {
        self.list_worksheets(workbook)
    }

    fn save_workbook(&mut self, workbook: &Workbook) -> Result<(), BridgeError> {
        self.save(workbook)
    }

    fn close_workbook(&mut self, workbook: Workbook) -> Result<(), BridgeError> {
        self.close(workbook)
    }

    fn quit(&mut self) -> Result<(), BridgeError> {
        self.shutdown()
    }
}
