//! Logger and logging macros
//!
//! The macros forward to the `log` crate facade so that every crate in the workspace
//! logs through `kestrel_core::{trace, debug, info, warn, error}` without depending on `log` directly.

use log4rs::{Config, Handle, config::Root};
use once_cell::sync::OnceCell;
use thiserror::Error;

mod appender;
mod consts;
mod logger;

use appender::AppenderSpec;
use consts::*;
use logger::Builder;

#[doc(hidden)]
pub use ::log as facade;

static LOGGER_HANDLE: OnceCell<Handle> = OnceCell::new();

#[derive(Error, Debug)]
pub enum LogError {
    #[error("invalid log directory {0}")]
    InvalidLogDir(String),

    #[error("failed building appender: {0}")]
    Appender(String),

    #[error("invalid logger spec: {0}")]
    ParseLoggerSpec(String),

    #[error("failed building log config: {0}")]
    Config(#[from] log4rs::config::runtime::ConfigErrors),

    #[error("a logger was already initialized")]
    AlreadyInitialized,
}

/// Initializes the global logger, writing to the console and, when `log_dir` is provided,
/// to a rolling log file plus a separate error-only file.
///
/// `filters` follows the `RUST_LOG` syntax (`info,kestrel_consensus=debug`); the `RUST_LOG`
/// environment variable overrides it entry by entry.
pub fn try_init_logger(log_dir: Option<&str>, filters: &str) -> Result<(), LogError> {
    let loggers = Builder::new().root_level(::log::LevelFilter::Info).parse_expression(filters).parse_env(DEFAULT_LOGGER_ENV).build();

    let mut appenders = vec![AppenderSpec::console(CONSOLE_APPENDER, None)];
    if let Some(log_dir) = log_dir {
        appenders.push(AppenderSpec::roller(LOG_FILE_APPENDER, None, log_dir, LOG_FILE_NAME)?);
        appenders.push(AppenderSpec::roller(ERR_LOG_FILE_APPENDER, Some(::log::LevelFilter::Warn), log_dir, ERR_LOG_FILE_NAME)?);
    }

    let names: Vec<&'static str> = appenders.iter().map(|x| x.name).collect();
    let config = Config::builder()
        .appenders(appenders.into_iter().map(|x| x.appender()))
        .loggers(loggers.items())
        .build(Root::builder().appenders(names).build(loggers.root_level()))?;

    let handle = log4rs::init_config(config).map_err(|_| LogError::AlreadyInitialized)?;
    LOGGER_HANDLE.set(handle).map_err(|_| LogError::AlreadyInitialized)
}

/// Same as [`try_init_logger`] but reports failures on stderr instead of returning them.
/// Calling it more than once is harmless.
pub fn init_logger(log_dir: Option<&str>, filters: &str) {
    if LOGGER_HANDLE.get().is_some() {
        return;
    }
    if let Err(err) = try_init_logger(log_dir, filters) {
        eprintln!("logger initialization failed: {err}");
    }
}

#[macro_export]
macro_rules! trace {
    ($($t:tt)*) => (
        $crate::log::facade::trace!($($t)*)
    )
}

#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => (
        $crate::log::facade::debug!($($t)*)
    )
}

#[macro_export]
macro_rules! info {
    ($($t:tt)*) => (
        $crate::log::facade::info!($($t)*)
    )
}

#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => (
        $crate::log::facade::warn!($($t)*)
    )
}

#[macro_export]
macro_rules! error {
    ($($t:tt)*) => (
        $crate::log::facade::error!($($t)*)
    )
}
