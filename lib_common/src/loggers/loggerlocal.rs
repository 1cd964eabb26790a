use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use glob::{glob, Pattern};
use log::LevelFilter;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("A global logger is already installed: {0}")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

#[derive(Debug, Clone)]
/// # Logger Local Options
///
/// Controls where and how log records are written.
pub struct LoggerLocalOptions {
    /// Prefix of every log file name, usually the binary name.
    pub app_name: String,
    /// The directory where log files are stored. Created if missing.
    pub log_dir: PathBuf,
    /// Maximum level that reaches the outputs.
    pub level: LevelFilter,
    /// Also echo records to stderr. Off while a full-screen UI owns the terminal.
    pub use_stderr: bool,
}

/// Maps a textual level (`trace`, `debug`, `info`, `warn`, `error`, `off`) to a
/// `LevelFilter`. Unknown values fall back to `Info`.
pub fn parse_level(log_level: &str) -> LevelFilter {
    match log_level.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" | "warning" => LevelFilter::Warn,
        "error" | "fatal" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// Rotates log files for a given application and log directory.
///
/// Keeps only the most recent log file (by the timestamp embedded in its
/// name) and deletes older ones. Returns how many files were removed.
pub fn rotate_logs(app_name: &str, log_dir: &Path) -> usize {
    let pattern = format!(
        "{}/{}-*.log",
        Pattern::escape(&log_dir.to_string_lossy()),
        Pattern::escape(app_name)
    );
    let paths = match glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Invalid log rotation pattern {}: {}", pattern, e);
            return 0;
        }
    };

    let mut log_files: Vec<PathBuf> = paths.flatten().collect();
    // Newest first; the names carry a sortable timestamp.
    log_files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    let mut removed = 0;
    for old_file in log_files.iter().skip(1) {
        match fs::remove_file(old_file) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Error deleting old log file {}: {}", old_file.display(), e),
        }
    }
    removed
}

/// Builds the `fern` dispatcher without installing it.
///
/// Creates the log directory, rotates the previous runs away and opens a new
/// timestamped file `<app_name>-<YYYYmmdd_HHMMSS>.log`.
pub fn build_dispatch(
    options: &LoggerLocalOptions,
) -> Result<(fern::Dispatch, PathBuf), LoggerError> {
    fs::create_dir_all(&options.log_dir)?;
    rotate_logs(&options.app_name, &options.log_dir);

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = options
        .log_dir
        .join(format!("{}-{}.log", options.app_name, timestamp));

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(options.level)
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("rustls", LevelFilter::Warn)
        .chain(fern::log_file(&log_path)?);

    if options.use_stderr {
        dispatch = dispatch.chain(std::io::stderr());
    }

    Ok((dispatch, log_path))
}

/// Installs the global logger. Returns the path of the file being written.
pub fn setup_logging(options: &LoggerLocalOptions) -> Result<PathBuf, LoggerError> {
    let (dispatch, log_path) = build_dispatch(options)?;
    dispatch.apply()?;
    Ok(log_path)
}
