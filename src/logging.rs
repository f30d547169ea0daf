use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "alfanumrik.log";

pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Stdout logging always; a daily-rolling file layer when the config asks
/// for one. The returned guard must be held for the process lifetime or the
/// non-blocking file writer drops buffered lines.
pub fn init_tracing(config: &Config) -> Option<FileLogGuard> {
    let env_filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    let file_writer = config.file_logs.as_ref().and_then(|file_config| {
        if let Err(err) = std::fs::create_dir_all(&file_config.dir) {
            eprintln!("failed to create log directory {}: {err}", file_config.dir);
            return None;
        }
        let appender = RollingFileAppender::new(Rotation::DAILY, &file_config.dir, LOG_FILE_PREFIX);
        Some(tracing_appender::non_blocking(appender))
    });

    match file_writer {
        Some((writer, guard)) => {
            registry
                .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
                .init();
            Some(FileLogGuard { _guard: guard })
        }
        None => {
            registry.init();
            None
        }
    }
}
