//! Logging setup for simulator executables.
//!
//! Records go to two sinks: the terminal, with coloured level tags, and the
//! session log file, in plain text so it can be grepped after a run.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use log::{self, Level, Record};
use fern::{Dispatch, FormatCallback};
use colored::Colorize;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Log target prefix of the simulation core library. Per-tick records from
/// the core are filtered separately so they don't flood the executive logs.
const CORE_TARGET: &str = "sim_lib";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The executive log level must be at least INFO, found {0}")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Could not open the session log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A global logger is already installed: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Install the global logger for this execution.
///
/// `min_level` applies to every target except the simulation core
/// (`sim_lib`), which is filtered at `core_level` instead. `min_level` must
/// let at least `Info` records through.
///
/// Only the first call in a process succeeds.
pub fn logger_init(
    min_level: LevelFilter,
    core_level: LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let terminal = Dispatch::new()
        .format(|out, message, record| write_record(out, message, record, true))
        .chain(std::io::stdout());

    let file = Dispatch::new()
        .format(|out, message, record| write_record(out, message, record, false))
        .chain(log_file);

    Dispatch::new()
        .level(min_level)
        .level_for(CORE_TARGET, core_level)
        .chain(terminal)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    log::info!(
        "Logger ready: level {}, core level {}, epoch {}",
        min_level,
        core_level,
        session::get_epoch().to_rfc3339()
    );
    log::info!("Writing log to {}", session.log_file_path.display());

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Emit one record as `<elapsed>s <TAG> [target] message`.
///
/// The target is only shown below `Info`, where it helps locate chatty
/// modules.
fn write_record(
    out: FormatCallback,
    message: &std::fmt::Arguments,
    record: &Record,
    colour: bool
) {
    let elapsed = session::get_elapsed_seconds();
    let tag = level_tag(record.level());

    let tag = match (colour, record.level()) {
        (false, _) => tag.normal(),
        (true, Level::Error) => tag.red().bold(),
        (true, Level::Warn) => tag.yellow(),
        (true, Level::Info) => tag.green(),
        (true, Level::Debug) => tag.blue(),
        (true, Level::Trace) => tag.dimmed()
    };

    if record.level() > Level::Info {
        out.finish(format_args!(
            "{:>11.4}s {} [{}] {}", elapsed, tag, record.target(), message
        ))
    }
    else {
        out.finish(format_args!("{:>11.4}s {} {}", elapsed, tag, message))
    }
}

/// Fixed width tag for a level.
fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn  => "WARN ",
        Level::Info  => "INFO ",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE"
    }
}
