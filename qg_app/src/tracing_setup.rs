use std::io;
use std::str::FromStr;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::config_loader::LogSettings;

/// Parse a level name, falling back to INFO for anything unrecognised
pub fn parse_level(level: &str) -> Level {
    Level::from_str(level).unwrap_or(Level::INFO)
}

/// Initialise tracing on stderr, plus a non-blocking hourly file when a log directory is configured
///
/// `RUST_LOG` wins over the configured level. Keep the returned guard alive
/// for the life of the program so buffered file output is flushed.
pub fn init(app_name: &str, settings: &LogSettings) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::builder().with_default_directive(parse_level(&settings.level).into()).from_env_lossy();

    // stderr keeps stdout free for the JSON lines the fetcher prints
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(true).with_line_number(true).with_ansi(true).compact();

    match &settings.dir {
        Some(dir) => {
            let _ = std::fs::create_dir_all(dir);
            let file_appender = tracing_appender::rolling::hourly(dir, format!("{app_name}.log"));
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let file_layer =
                fmt::layer().with_writer(non_blocking).with_target(true).with_thread_ids(true).with_line_number(true).with_ansi(false).compact();

            tracing_subscriber::registry().with(env_filter).with(stderr_layer).with(file_layer).init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(env_filter).with(stderr_layer).init();
            None
        }
    }
}
