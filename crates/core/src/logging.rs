//! Tracing setup: console output plus the optional daily log file.
//!
//! When file logging is enabled, events at INFO and above are appended to
//! `adsync<year><month><day>.log` in the configured directory, one line each:
//!
//! ```text
//! INFO: 2024/03/05 02:00:01 12 records retrieved
//! ERROR: 2024/03/05 02:00:02 client.rs:88: ldap modify error: insufficientAccessRights
//! ```

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Datelike, Local, NaiveDate};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::error::{AdSyncError, Result};

/// Name of the log file for a given day. Month and day are not zero-padded.
pub fn log_file_name(date: NaiveDate) -> String {
    format!("adsync{}{}{}.log", date.year(), date.month(), date.day())
}

/// Full path of today's log file under `location`.
pub fn log_file_path(location: &Path) -> PathBuf {
    location.join(log_file_name(Local::now().date_naive()))
}

/// Open (or create) the log file for appending.
pub fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            AdSyncError::Config(format!("failed to open log file {}: {e}", path.display()))
        })
}

/// Event formatter for the log file.
///
/// Errors carry the source file and line of the event; everything else is
/// written under the `INFO:` prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFileFormat;

impl<S, N> FormatEvent<S, N> for LogFileFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let timestamp = Local::now().format("%Y/%m/%d %H:%M:%S");

        if *meta.level() == Level::ERROR {
            let file = meta.file().map(short_file_name).unwrap_or("???");
            let line = meta.line().unwrap_or(0);
            write!(writer, "ERROR: {timestamp} {file}:{line}: ")?;
        } else {
            write!(writer, "INFO: {timestamp} ")?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn short_file_name(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path)
}

/// Build the file layer, or `None` when file logging is disabled.
pub fn file_layer<S>(config: &LoggingConfig) -> Result<Option<impl Layer<S>>>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    if !config.enabled {
        return Ok(None);
    }

    let file = open_log_file(&log_file_path(&config.location))?;
    Ok(Some(file_layer_with_writer(file)))
}

fn file_layer_with_writer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(LogFileFormat)
        .with_writer(Mutex::new(file))
        .with_filter(LevelFilter::INFO)
}

/// Install the global subscriber: stderr output filtered by `RUST_LOG`
/// (default `info`), plus the daily log file when enabled.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    tracing_subscriber::registry()
        .with(file_layer::<Registry>(config)?)
        .with(console)
        .try_init()
        .map_err(|e| AdSyncError::Config(format!("failed to initialize logging: {e}")))
}
