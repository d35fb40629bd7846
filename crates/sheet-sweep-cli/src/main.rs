//! sheet-sweep CLI - batch spreadsheet processing through Excel

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sheet_sweep::{
    is_processable, walk, Engine, EngineConfig, Filesystem, Hooks, RunReport, RunStatus,
    StdFilesystem,
};
use sheet_sweep_excel_com::{ExcelBridge, ExcelBridgeConfig};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sweep")]
#[command(
    author,
    version,
    about = "Run every spreadsheet in a folder through Excel"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the spreadsheets a sweep would process, without opening them
    List {
        /// Folder to scan (default: current directory)
        folder: Option<PathBuf>,

        /// Only look at the folder's direct files
        #[arg(long)]
        no_recursive: bool,
    },

    /// Open every spreadsheet in Excel, recalculate it and save it
    Recalc {
        /// Folder to sweep (prompted for when omitted)
        folder: Option<PathBuf>,

        /// Only process the folder's direct files
        #[arg(long)]
        no_recursive: bool,

        /// Close workbooks without saving
        #[arg(long)]
        no_save: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        bridge: BridgeArgs,
    },
}

#[derive(Args)]
struct BridgeArgs {
    /// Path to excel-com-bridge.exe
    #[arg(long, env = "SWEEP_BRIDGE_EXE")]
    bridge_exe: Option<PathBuf>,

    /// WINE executable
    #[arg(long, env = "SWEEP_WINE", default_value = "wine")]
    wine: PathBuf,

    /// WINEPREFIX to run Excel in
    #[arg(long, env = "WINEPREFIX")]
    wine_prefix: Option<PathBuf>,
}

impl From<BridgeArgs> for ExcelBridgeConfig {
    fn from(args: BridgeArgs) -> Self {
        Self {
            bridge_exe_path: args.bridge_exe,
            wine_path: args.wine,
            wine_prefix: args.wine_prefix,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::List {
            folder,
            no_recursive,
        } => list(folder.as_deref(), !no_recursive),
        Commands::Recalc {
            folder,
            no_recursive,
            no_save,
            json,
            bridge,
        } => recalc(folder, !no_recursive, !no_save, json, bridge.into()),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn list(folder: Option<&Path>, recursive: bool) -> Result<ExitCode> {
    let root = folder.unwrap_or(Path::new("."));
    let fs = StdFilesystem;
    let folder = fs
        .resolve(root)
        .with_context(|| format!("Cannot sweep '{}'", root.display()))?;

    let mut found = 0usize;
    let skipped = walk(&fs, &folder, recursive, &mut |path: &Path| {
        if is_processable(path) {
            println!("{}", path.display());
            found += 1;
        }
    });

    eprintln!("{found} spreadsheet(s), {} folder(s) unreadable", skipped.len());
    if skipped.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn recalc(
    folder: Option<PathBuf>,
    recursive: bool,
    save: bool,
    json: bool,
    bridge: ExcelBridgeConfig,
) -> Result<ExitCode> {
    let excel = ExcelBridge::start(bridge).context("Failed to start Excel bridge")?;

    let hooks = Hooks::<ExcelBridge>::new()
        .per_sheet(|ctx, _wb, sheet| {
            tracing::info!("{}: {sheet}", ctx.path().display());
            Ok(())
        })
        .post(|ctx, _wb| {
            ctx.app().recalculate()?;
            Ok(())
        });

    let config = EngineConfig {
        save_on_success: save,
        recursive,
    };
    let mut engine = Engine::new(excel, hooks, config);

    let status = match folder {
        Some(folder) => engine.run(&folder),
        None => engine.run_interactive(&mut prompt_for_folder, recursive),
    };

    // Excel must be released even when the sweep itself failed
    let quit = engine.quit();
    let code = finish(engine.report(), status, json, &mut io::stdout().lock())?;
    quit.context("Failed to shut down Excel")?;
    Ok(code)
}

/// Print what was gathered, then surface a run-level failure if there was
/// one. Counts from before an aborted walk are still shown.
fn finish(
    report: &RunReport,
    status: sheet_sweep::Result<RunStatus>,
    json: bool,
    out: &mut impl Write,
) -> Result<ExitCode> {
    print_report(report, json, out)?;
    let status = status.context("Sweep aborted")?;

    if status == RunStatus::Cancelled
        || report.has_errors()
        || !report.unreadable_folders().is_empty()
    {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Ask on the terminal; an empty line or EOF cancels.
fn prompt_for_folder() -> Option<PathBuf> {
    eprint!("Folder to sweep (empty to cancel): ");
    io::stderr().flush().ok()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    let line = line.trim();
    (!line.is_empty()).then(|| PathBuf::from(line))
}

fn print_report(report: &RunReport, json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(report).context("Failed to encode report")?;
        writeln!(out, "{text}")?;
        return Ok(());
    }

    writeln!(
        out,
        "Processed {} file(s): {} succeeded, {} failed",
        report.files_visited(),
        report.success_count(),
        report.error_count()
    )?;
    let errors = report.error_report();
    if !errors.is_empty() {
        writeln!(out)?;
        writeln!(out, "{errors}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheet_sweep::{SweepError, WalkError};

    #[test]
    fn report_is_printed_before_a_walk_error() {
        let report = RunReport::new();
        let status = Err(SweepError::Walk(WalkError::FolderNotFound(PathBuf::from(
            "/gone",
        ))));
        let mut out = Vec::new();

        let err = finish(&report, status, false, &mut out).unwrap_err();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Processed 0 file(s): 0 succeeded, 0 failed\n"
        );
        assert_eq!(err.to_string(), "Sweep aborted");
    }

    #[test]
    fn cancelled_run_fails_with_json_report() {
        let report = RunReport::new();
        let mut out = Vec::new();

        let code = finish(&report, Ok(RunStatus::Cancelled), true, &mut out).unwrap();

        assert_eq!(code, ExitCode::FAILURE);
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["error_count"], 0);
    }

    #[test]
    fn clean_run_succeeds() {
        let mut out = Vec::new();
        let code = finish(&RunReport::new(), Ok(RunStatus::Completed), false, &mut out).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }
}
