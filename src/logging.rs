use crate::error::{Error, Result};
use crate::session::Intent;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILE: &str = "typetester.log";

/// Install a file-backed subscriber. The terminal belongs to the TUI, so
/// nothing is written to stdout or stderr. Keep the guard alive until exit
/// or buffered lines are lost.
pub fn init(path: &Path) -> Result<WorkerGuard> {
    let (dir, file_name) = split_log_path(path)?;
    fs::create_dir_all(&dir)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        dir, file_name,
    ));

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    Ok(guard)
}

fn split_log_path(path: &Path) -> Result<(PathBuf, OsString)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("not a log file: {}", path.display())))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name.to_os_string()))
}

/// Forward the session's diagnostic messages to the log
pub fn record(intents: &[Intent]) {
    for intent in intents {
        if let Intent::Log(msg) = intent {
            tracing::info!("From session: {msg}");
        }
    }
}
