//! DryDupe - duplicate file finder backed by a SQLite record store
//!
//! A run walks one or more directories, hashes every file with BLAKE3 and
//! records `(path, hash, size)` in a per-run [`store::RecordStore`]. Hashes
//! shared by two or more files become duplicate groups, materialized in the
//! store's `result` table and rendered as JSON, text, HTML, or exported as
//! the SQLite database itself.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod scanner;
pub mod signal;
pub mod stats;
pub mod store;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{bail, Context};

use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::output::{HtmlOutput, JsonOutput, OutputFormat, Report, TextOutput};
use crate::stats::Stats;
use crate::store::RecordStore;

/// File name of the record store when no `--database` is given.
const TEMP_STORE_NAME: &str = "records.db";

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for invalid configuration, unreadable roots, record
/// store failures, report I/O, or interruption.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    config.apply_cli(&cli);

    let shutdown = signal::install_handler();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&config, &cli.paths, Some(shutdown.get_flag()), &mut out)
}

/// Scan `roots` and write the report described by `config`.
///
/// Text and JSON reports go to `out` when
/// [`Config::writes_to_terminal`] says so; every other report is written to
/// [`Config::output_path`].
///
/// # Errors
///
/// See [`run_app`].
pub fn run<W: Write>(
    config: &Config,
    roots: &[PathBuf],
    shutdown: Option<Arc<AtomicBool>>,
    out: &mut W,
) -> anyhow::Result<ExitCode> {
    let format: OutputFormat = config.format.parse()?;

    let (db_path, temp_dir) = match &config.database {
        Some(path) => (path.clone(), None),
        None => {
            let dir = tempfile::Builder::new()
                .prefix("drydupe-")
                .tempdir()
                .context("failed to create temporary directory for the record store")?;
            (dir.path().join(TEMP_STORE_NAME), Some(dir))
        }
    };

    let mut store = RecordStore::with_path(&db_path)?;
    let existing = store.file_count()?;
    if existing > 0 {
        bail!(
            "record store {} already holds {} files; choose a new --database path",
            db_path.display(),
            existing
        );
    }
    log::debug!("Record store at {}", db_path.display());

    let mut finder_config = FinderConfig::default()
        .with_io_threads(config.io_threads)
        .with_walker_config(config.walker_config());
    if let Some(flag) = shutdown {
        finder_config = finder_config.with_shutdown_flag(flag);
    }

    let mut stats = Stats::new();
    let outcome = DuplicateFinder::new(finder_config).find_duplicates(roots, &mut store, &mut stats)?;
    let report = Report::from_store(&store, &stats)?;

    if config.writes_to_terminal(format) {
        write_report(format, &report, out)?;
    } else {
        let dest = config.output_path(format);
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        if format == OutputFormat::Sqlite {
            if is_same_file(&db_path, &dest) {
                log::debug!("Record store is already at {}", dest.display());
            } else {
                store.export_to(&dest)?;
            }
        } else {
            let file = File::create(&dest)
                .with_context(|| format!("failed to create {}", dest.display()))?;
            let mut writer = BufWriter::new(file);
            write_report(format, &report, &mut writer)?;
            writer.flush()?;
        }
        log::info!("Report written to {}", dest.display());
    }

    store.close()?;
    drop(temp_dir);

    Ok(if outcome.skipped > 0 {
        ExitCode::PartialSuccess
    } else if report.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    })
}

/// Render a text, JSON or HTML report into `writer`.
fn write_report<W: Write>(format: OutputFormat, report: &Report, writer: &mut W) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => JsonOutput::new(report).write_to(writer, true)?,
        OutputFormat::Stdout => TextOutput::new(report).write_to(writer)?,
        OutputFormat::Html => HtmlOutput::new(report).write_to(writer)?,
        OutputFormat::Sqlite | OutputFormat::Invalid => {
            bail!("{} reports are not rendered", format)
        }
    }
    Ok(())
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
