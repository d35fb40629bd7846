//! Windows process that drives Excel through COM on behalf of the sweep
//! client. Reads one `Request` per line from stdin and answers with one
//! `Response` per line on stdout. Diagnostics go to stderr only.
//!
//! Cross-compiled from Linux (`--target x86_64-pc-windows-gnu`) and run
//! under WINE.

#[cfg(windows)]
mod dispatch;
#[cfg(windows)]
mod excel;

#[cfg(not(windows))]
fn main() {
    eprintln!("excel-com-bridge only runs on Windows (or under WINE)");
    std::process::exit(1);
}

#[cfg(windows)]
fn main() {
    use std::io::{self, BufRead, Write};

    use excel_com_protocol::{Command, Request, Response, ResponseResult};

    log("starting");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut session = Session::default();

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log(&format!("stdin read error: {e}"));
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (response, shutdown) = match serde_json::from_str::<Request>(line) {
            Ok(request) => {
                let shutdown = matches!(request.command, Command::Shutdown);
                (
                    Response {
                        id: request.id,
                        result: session.handle(request.command),
                    },
                    shutdown,
                )
            }
            // id 0: the request could not be correlated
            Err(e) => (
                Response {
                    id: 0,
                    result: ResponseResult::Error {
                        message: format!("JSON parse error: {e}"),
                    },
                },
                false,
            ),
        };

        match serde_json::to_string(&response) {
            Ok(json) => {
                let _ = writeln!(out, "{json}");
                let _ = out.flush();
            }
            Err(e) => log(&format!("failed to encode response: {e}")),
        }

        if shutdown && matches!(response.result, ResponseResult::Ok { .. }) {
            break;
        }
    }

    session.teardown();
    log("exiting");
}

#[cfg(windows)]
fn log(msg: &str) {
    eprintln!("[excel-com-bridge] {msg}");
}

/// Excel state for the lifetime of the process.
#[cfg(windows)]
#[derive(Default)]
struct Session {
    excel: Option<excel::ExcelApp>,
}

#[cfg(windows)]
impl Session {
    fn handle(&mut self, command: excel_com_protocol::Command) -> excel_com_protocol::ResponseResult {
        use excel_com_protocol::{Command, ResponseData, ResponseResult};

        let ok = |data| ResponseResult::Ok { data };

        match command {
            Command::Init => self.init(),
            Command::Shutdown => self.shutdown(),
            command => {
                let Some(app) = self.excel.as_mut() else {
                    return ResponseResult::Error {
                        message: "Excel not initialized. Send 'Init' first.".to_string(),
                    };
                };
                let result = match command {
                    Command::OpenWorkbook { path } => app
                        .open_workbook(&path)
                        .map(|workbook| Some(ResponseData::WorkbookHandle { workbook })),
                    Command::ListWorksheets { workbook } => app
                        .list_worksheets(workbook)
                        .map(|worksheets| Some(ResponseData::Worksheets { worksheets })),
                    Command::SetCellValue {
                        workbook,
                        sheet,
                        cell,
                        value,
                    } => app
                        .set_cell_value(workbook, &sheet, &cell, &value)
                        .map(|()| None),
                    Command::GetCellValue {
                        workbook,
                        sheet,
                        cell,
                    } => app
                        .get_cell_value(workbook, &sheet, &cell)
                        .map(|value| Some(ResponseData::Value { value })),
                    Command::Recalculate => app.recalculate().map(|()| None),
                    Command::SaveWorkbook { workbook } => {
                        app.save_workbook(workbook).map(|()| None)
                    }
                    Command::CloseWorkbook { workbook } => {
                        app.close_workbook(workbook).map(|()| None)
                    }
                    Command::Init | Command::Shutdown => unreachable!("handled above"),
                };
                match result {
                    Ok(data) => ok(data),
                    Err(message) => ResponseResult::Error { message },
                }
            }
        }
    }

    fn init(&mut self) -> excel_com_protocol::ResponseResult {
        use excel_com_protocol::ResponseResult;
        use windows::Win32::System::Com::{CoInitializeEx, COINIT_APARTMENTTHREADED};

        if self.excel.is_some() {
            return ResponseResult::Ok { data: None };
        }

        // Excel requires a single-threaded apartment
        if let Err(e) = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }.ok() {
            return ResponseResult::Error {
                message: format!("CoInitializeEx failed: {e}"),
            };
        }

        match excel::ExcelApp::new() {
            Ok(app) => {
                log("Excel.Application created");
                self.excel = Some(app);
                ResponseResult::Ok { data: None }
            }
            Err(e) => ResponseResult::Error {
                message: format!("Failed to create Excel.Application: {e}"),
            },
        }
    }

    fn shutdown(&mut self) -> excel_com_protocol::ResponseResult {
        use excel_com_protocol::ResponseResult;

        let Some(app) = self.excel.take() else {
            return ResponseResult::Ok { data: None };
        };
        match app.shutdown() {
            Ok(()) => {
                unsafe { windows::Win32::System::Com::CoUninitialize() };
                ResponseResult::Ok { data: None }
            }
            Err(e) => ResponseResult::Error {
                message: format!("Shutdown failed: {e}"),
            },
        }
    }

    /// Stdin closed without a Shutdown; quit Excel so no orphan is left.
    fn teardown(&mut self) {
        if self.excel.is_some() {
            log("stdin closed, shutting down Excel");
            let _ = self.shutdown();
        }
    }
}
