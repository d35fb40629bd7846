//! Shared protocol types for communication between the native sweep client
//! and the Windows COM bridge process running under WINE.
//!
//! The protocol is JSON-over-stdio: one JSON object per line in each direction.
//! Workbooks are addressed by opaque handles issued by the bridge on open.

use serde::{Deserialize, Serialize};

/// A command sent from the client to the bridge process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Monotonically increasing request ID for correlating responses.
    pub id: u64,
    #[serde(flatten)]
    pub command: Command,
}

/// Commands the client can send to the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params")]
pub enum Command {
    /// Initialize COM and create the Excel.Application instance.
    Init,

    /// Open an existing workbook (Windows path). Returns a workbook handle.
    OpenWorkbook { path: String },

    /// Names of the workbook's worksheets in tab order.
    ListWorksheets { workbook: u64 },

    /// Set a cell's value (number, string, or bool).
    SetCellValue {
        workbook: u64,
        sheet: SheetRef,
        cell: String,
        value: CellValue,
    },

    /// Get a cell's computed value.
    GetCellValue {
        workbook: u64,
        sheet: SheetRef,
        cell: String,
    },

    /// Force a full recalculation of all open workbooks.
    Recalculate,

    /// Save the workbook in place, keeping its format.
    SaveWorkbook { workbook: u64 },

    /// Close a workbook without saving.
    CloseWorkbook { workbook: u64 },

    /// Shut down the bridge: close all workbooks, quit Excel, uninitialize COM.
    Shutdown,
}

/// Reference to a worksheet, by 0-based index or by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetRef {
    Index(u32),
    Name(String),
}

impl From<u32> for SheetRef {
    fn from(index: u32) -> Self {
        SheetRef::Index(index)
    }
}

impl From<&str> for SheetRef {
    fn from(name: &str) -> Self {
        SheetRef::Name(name.to_string())
    }
}

/// A cell value that can be sent to/from Excel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Error(CellError),
}

/// Excel error values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellError {
    pub code: String,
}

/// A response sent from the bridge back to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The request ID this response corresponds to.
    pub id: u64,
    #[serde(flatten)]
    pub result: ResponseResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ResponseResult {
    #[serde(rename = "ok")]
    Ok {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<ResponseData>,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Data returned in successful responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    /// Handle to a newly opened workbook.
    WorkbookHandle { workbook: u64 },
    /// Worksheet names in tab order.
    Worksheets { worksheets: Vec<String> },
    /// A cell value.
    Value { value: CellValue },
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, "<empty>"),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Error(e) => write!(f, "{}", e.code),
        }
    }
}
