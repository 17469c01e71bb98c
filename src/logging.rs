//! Logging system initialization
//!
//! Sets up the tracing subscriber according to the loaded configuration:
//! console or file output, plain or json format, env-filter level.

use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;

/// Initialize the tracing subscriber.
///
/// Returns a `WorkerGuard` that must be kept alive for the duration of the
/// program so buffered log writes are flushed on shutdown.
///
/// # Panics
/// * If opening the log file fails
/// * If a global subscriber is already installed
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let to_file = !config.logging.file.is_empty();

    let writer: Box<dyn std::io::Write + Send + Sync> = if to_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.logging.file)
            .expect("Failed to open log file");
        Box::new(file)
    } else {
        Box::new(std::io::stdout())
    };

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = tracing_subscriber::EnvFilter::new(config.logging.level.clone());

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(!to_file);

    if config.logging.format == "json" {
        subscriber_builder.json().init();
    } else {
        subscriber_builder.init();
    }

    guard
}
