//! Log setup: stderr plus a daily file under the console's storage root.
//!
//! `ADMIN_CONSOLE_LOG` takes an `EnvFilter` directive (default `info`).
//! `ADMIN_CONSOLE_DEBUG_LOG=1` forces `debug` regardless.

use std::env;

use console_core::StorageConfig;
use fs_err as fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_ENV: &str = "ADMIN_CONSOLE_LOG";
const DEBUG_ENV: &str = "ADMIN_CONSOLE_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "console-ctl.log";

/// Installs the global subscriber. Hold the returned guard until exit or
/// buffered file output is lost.
pub fn init(storage: Option<&StorageConfig>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match storage.and_then(file_writer) {
        Some((writer, guard)) => (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        ),
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init();
    if let Err(err) = result {
        eprintln!("console-ctl: failed to install logger: {}", err);
    }
    guard
}

fn env_filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn file_writer(
    storage: &StorageConfig,
) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let dir = storage.logs_dir();
    if let Err(err) = fs::create_dir_all(&dir) {
        eprintln!("console-ctl: file logging disabled: {}", err);
        return None;
    }
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    Some(tracing_appender::non_blocking(appender))
}
