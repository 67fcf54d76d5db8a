use anyhow::{Context, Result};
use inset_core::LogConfig;
use std::fs::File;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Keeps the file writer thread alive; flushes on drop.
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Install the global subscriber described by `config`.
pub fn init(config: &LogConfig) -> Result<Option<LogGuard>> {
    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::builder()
        .with_default_directive(config.parse_level().into())
        .from_env_lossy();

    let console_layer = config.console_output.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter.clone())
    });

    let (file_layer, guard) = if config.file_output {
        config
            .ensure_log_directory()
            .context("Failed to create log directory")?;
        match config.cleanup_old_logs() {
            Ok(0) => {}
            Ok(removed) => eprintln!("Removed {removed} old log file(s)"),
            Err(e) => eprintln!("Warning: failed to clean up old log files: {e}"),
        }

        let path = config.current_log_path();
        let file = File::create(&path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        let (writer, worker_guard) = tracing_appender::non_blocking(file);

        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(filter);
        (Some(layer), Some(LogGuard { _guard: worker_guard }))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::debug!(level = %config.level, file = config.file_output, "logging initialized");
    Ok(guard)
}
