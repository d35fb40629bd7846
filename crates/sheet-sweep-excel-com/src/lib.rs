//! Excel as a sheet-sweep spreadsheet application, driven through a WINE
//! bridge process.
//!
//! This crate spawns a Windows `.exe` under WINE that automates Excel through COM,
//! communicating over JSON-over-stdio. [`ExcelBridge`] implements
//! [`sheet_sweep::SpreadsheetApp`], so one Excel instance can serve a whole
//! sweep; hooks reach the bridge through `HookContext::app` for cell access
//! and recalculation.
//!
//! # Architecture
//!
//! ```text
//! sheet_sweep::Engine
//!     └── ExcelBridge (this crate)
//!           └── spawns: wine excel-com-bridge.exe
//!                 └── COM: Excel.Application
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use sheet_sweep::{Engine, EngineConfig, Hooks};
//! use sheet_sweep_excel_com::{ExcelBridge, ExcelBridgeConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bridge = ExcelBridge::start(ExcelBridgeConfig::default())?;
//!     let hooks = Hooks::<ExcelBridge>::new().post(|ctx, _wb| {
//!         ctx.app().recalculate()?;
//!         Ok(())
//!     });
//!     let mut engine = Engine::new(bridge, hooks, EngineConfig::default());
//!     engine.run("/data/reports")?;
//!     println!("{}", engine.report().error_report());
//!     engine.quit()?;
//!     Ok(())
//! }
//! ```

mod app;
mod bridge;
mod workbook;

pub use bridge::{linux_to_wine_path, BridgeError, ExcelBridge, ExcelBridgeConfig};
pub use excel_com_protocol::{CellValue, SheetRef};
pub use workbook::{Workbook, Worksheet};
