//! Example: stamp every worksheet of every workbook under a folder.
//!
//! For each workbook this:
//! 1. Reads the current value of A1 on each sheet
//! 2. Writes a "Reviewed" marker into Z1 on each sheet
//! 3. Has Excel recalculate, then saves in place
//!
//! Prerequisites:
//!   - WINE installed and in PATH
//!   - Microsoft Excel installed in the WINE prefix
//!   - excel-com-bridge.exe built:
//!     cargo build --target x86_64-pc-windows-gnu -p excel-com-bridge --release
//!
//! Run:
//!   cargo run --example stamp_sheets -p sheet-sweep-excel-com -- /path/to/folder

use sheet_sweep::{Engine, EngineConfig, Hooks};
use sheet_sweep_excel_com::{ExcelBridge, ExcelBridgeConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let folder = std::env::args()
        .nth(1)
        .ok_or("usage: stamp_sheets <folder>")?;

    println!("Starting Excel COM bridge...");
    let bridge = ExcelBridge::start(ExcelBridgeConfig::default())?;

    let hooks = Hooks::<ExcelBridge>::new()
        .per_sheet(|ctx, wb, sheet| {
            let bridge = ctx.app();
            let a1 = bridge.get_cell_value(wb, sheet, "A1")?;
            println!("  {} [{}] A1 = {a1}", wb.path().display(), sheet.name());
            bridge.set_cell_value(wb, sheet, "Z1", "Reviewed")?;
            Ok(())
        })
        .post(|ctx, _wb| {
            ctx.app().recalculate()?;
            Ok(())
        });

    let mut engine = Engine::new(bridge, hooks, EngineConfig::default());
    let result = engine.run(&folder);

    let report = engine.report();
    println!(
        "\n{} stamped, {} failed",
        report.success_count(),
        report.error_count()
    );
    if report.has_errors() {
        println!("{}", report.error_report());
    }

    // Release Excel even if the walk itself failed
    engine.quit()?;
    result?;
    Ok(())
}
