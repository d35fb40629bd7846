//! Subprocess management and JSON IPC for the WINE bridge process.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};

use excel_com_protocol::{
    CellValue, Command as BridgeCommand, Request, Response, ResponseData, ResponseResult, SheetRef,
};

use crate::workbook::{Workbook, Worksheet};

/// Errors from the Excel COM bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Failed to spawn WINE bridge process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("Bridge process not running")]
    NotRunning,

    #[error("Failed to send command to bridge: {0}")]
    SendFailed(String),

    #[error("Failed to read response from bridge: {0}")]
    ReadFailed(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Excel reported a failure; the message is passed through untouched
    #[error("{0}")]
    Excel(String),

    #[error("Unexpected response data")]
    UnexpectedResponse,

    #[error("Response id {got} does not match request id {expected}")]
    ResponseMismatch { expected: u64, got: u64 },

    #[error("WINE not found. Install WINE and ensure 'wine' is in PATH.")]
    WineNotFound,

    #[error("Bridge executable not found at: {0}")]
    BridgeExeNotFound(String),
}

/// Configuration for the Excel COM bridge.
#[derive(Debug, Clone)]
pub struct ExcelBridgeConfig {
    /// Path to the `excel-com-bridge.exe` Windows executable.
    /// If None, will search in common locations relative to the current binary.
    pub bridge_exe_path: Option<PathBuf>,

    /// Path to the WINE executable. Defaults to "wine".
    pub wine_path: PathBuf,

    /// Optional WINEPREFIX to use (for isolating the WINE environment).
    pub wine_prefix: Option<PathBuf>,
}

impl Default for ExcelBridgeConfig {
    fn default() -> Self {
        Self {
            bridge_exe_path: None,
            wine_path: PathBuf::from("wine"),
            wine_prefix: None,
        }
    }
}

/// A live Excel instance behind the bridge process.
///
/// Requests are strictly sequential: each call writes one request line and
/// blocks until the matching response line arrives. There is no timeout.
pub struct ExcelBridge {
    child: Option<Child>,
    writer: Box<dyn Write + Send>,
    reader: Box<dyn BufRead + Send>,
    next_id: u64,
    running: bool,
}

impl ExcelBridge {
    /// Start the bridge process and initialize Excel.
    pub fn start(config: ExcelBridgeConfig) -> Result<Self, BridgeError> {
        let exe_path = config.bridge_exe_path.unwrap_or_else(find_bridge_exe);

        if !exe_path.exists() {
            return Err(BridgeError::BridgeExeNotFound(
                exe_path.display().to_string(),
            ));
        }

        let mut cmd = std::process::Command::new(&config.wine_path);

        if let Some(prefix) = &config.wine_prefix {
            cmd.env("WINEPREFIX", prefix);
        }

        cmd.arg(&exe_path);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit()); // Bridge diagnostics go to our stderr

        tracing::info!("Starting Excel bridge: {:?}", cmd);
        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BridgeError::WineNotFound
            } else {
                BridgeError::SpawnFailed(e)
            }
        })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(BridgeError::NotRunning);
        };

        let mut bridge = Self::from_streams(BufReader::new(stdout), stdin);
        bridge.child = Some(child);

        // Initialize COM and Excel
        bridge.send_command(BridgeCommand::Init)?;

        Ok(bridge)
    }

    /// Talk to a bridge over already-connected streams.
    ///
    /// No `Init` is sent; the caller is responsible for the bridge state.
    pub fn from_streams(
        reader: impl BufRead + Send + 'static,
        writer: impl Write + Send + 'static,
    ) -> Self {
        Self {
            child: None,
            writer: Box::new(writer),
            reader: Box::new(reader),
            next_id: 1,
            running: true,
        }
    }

    /// Send a command to the bridge and wait for the response.
    fn send_command(&mut self, command: BridgeCommand) -> Result<Option<ResponseData>, BridgeError> {
        if !self.running {
            return Err(BridgeError::NotRunning);
        }

        let id = self.next_id;
        self.next_id += 1;

        let request = Request { id, command };
        let json = serde_json::to_string(&request)?;
        tracing::trace!("-> {json}");

        writeln!(self.writer, "{json}").map_err(|e| BridgeError::SendFailed(e.to_string()))?;
        self.writer
            .flush()
            .map_err(|e| BridgeError::SendFailed(e.to_string()))?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| BridgeError::ReadFailed(e.to_string()))?;

        if line.is_empty() {
            self.running = false;
            return Err(BridgeError::NotRunning);
        }
        tracing::trace!("<- {}", line.trim_end());

        let response: Response = serde_json::from_str(&line)?;
        if response.id != id {
            return Err(BridgeError::ResponseMismatch {
                expected: id,
                got: response.id,
            });
        }

        match response.result {
            ResponseResult::Ok { data } => Ok(data),
            ResponseResult::Error { message } => Err(BridgeError::Excel(message)),
        }
    }

    /// Open an existing workbook from a Linux path.
    pub fn open(&mut self, path: &Path) -> Result<Workbook, BridgeError> {
        let data = self.send_command(BridgeCommand::OpenWorkbook {
            path: linux_to_wine_path(path),
        })?;
        match data {
            Some(ResponseData::WorkbookHandle { workbook }) => Ok(Workbook::new(workbook, path)),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Worksheets of `workbook` in tab order.
    pub fn list_worksheets(&mut self, workbook: &Workbook) -> Result<Vec<Worksheet>, BridgeError> {
        let data = self.send_command(BridgeCommand::ListWorksheets {
            workbook: workbook.handle(),
        })?;
        match data {
            Some(ResponseData::Worksheets { worksheets }) => Ok(worksheets
                .into_iter()
                .enumerate()
                .map(|(index, name)| Worksheet::new(index as u32, name))
                .collect()),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Force Excel to recalculate all open workbooks.
    pub fn recalculate(&mut self) -> Result<(), BridgeError> {
        self.send_command(BridgeCommand::Recalculate)?;
        Ok(())
    }

    /// Set a cell's value.
    ///
    /// Accepts anything that converts to CellValue:
    /// - `&str` / `String` -> String value
    /// - `f64` -> Number value
    /// - `bool` -> Boolean value
    pub fn set_cell_value(
        &mut self,
        workbook: &Workbook,
        sheet: impl Into<SheetRef>,
        cell: &str,
        value: impl Into<CellValue>,
    ) -> Result<(), BridgeError> {
        self.send_command(BridgeCommand::SetCellValue {
            workbook: workbook.handle(),
            sheet: sheet.into(),
            cell: cell.to_string(),
            value: value.into(),
        })?;
        Ok(())
    }

    /// Get a cell's computed value.
    pub fn get_cell_value(
        &mut self,
        workbook: &Workbook,
        sheet: impl Into<SheetRef>,
        cell: &str,
    ) -> Result<CellValue, BridgeError> {
        let data = self.send_command(BridgeCommand::GetCellValue {
            workbook: workbook.handle(),
            sheet: sheet.into(),
            cell: cell.to_string(),
        })?;
        match data {
            Some(ResponseData::Value { value }) => Ok(value),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Save the workbook in place, keeping its format.
    pub fn save(&mut self, workbook: &Workbook) -> Result<(), BridgeError> {
        self.send_command(BridgeCommand::SaveWorkbook {
            workbook: workbook.handle(),
        })?;
        Ok(())
    }

    /// Close the workbook without saving.
    pub fn close(&mut self, workbook: Workbook) -> Result<(), BridgeError> {
        self.send_command(BridgeCommand::CloseWorkbook {
            workbook: workbook.handle(),
        })?;
        Ok(())
    }

    /// Shut down the bridge: close all workbooks, quit Excel, and wait for the
    /// process to exit. Does nothing if already shut down.
    pub fn shutdown(&mut self) -> Result<(), BridgeError> {
        if !self.running {
            return Ok(());
        }

        let result = self.send_command(BridgeCommand::Shutdown).map(|_| ());
        self.running = false;

        if let Some(mut child) = self.child.take() {
            let _ = child.wait();
        }

        result
    }
}

/// Convert a Linux filesystem path to a WINE (Windows) path.
///
/// WINE maps `/` to `Z:\`, so `/home/user/file.xlsx` becomes `Z:\home\user\file.xlsx`.
pub fn linux_to_wine_path(linux_path: &Path) -> String {
    let abs = if linux_path.is_absolute() {
        linux_path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(linux_path)
    };

    format!("Z:{}", abs.display()).replace('/', "\\")
}

/// Attempt to locate the bridge exe relative to the current executable or in common paths.
fn find_bridge_exe() -> PathBuf {
    if let Ok(mut exe) = std::env::current_exe() {
        exe.pop();
        let candidate = exe.join("excel-com-bridge.exe");
        if candidate.exists() {
            return candidate;
        }
    }

    // Development builds
    for profile in ["release", "debug"] {
        let target_path =
            PathBuf::from(format!("target/x86_64-pc-windows-gnu/{profile}/excel-com-bridge.exe"));
        if target_path.exists() {
            return target_path;
        }
    }

    PathBuf::from("excel-com-bridge.exe")
}
