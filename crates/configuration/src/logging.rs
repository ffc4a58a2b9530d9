use crate::error::ConfigError;
use crate::settings::LoggingSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

/// Installs the global subscriber, writing to `<directory>/<file_name>`.
///
/// The returned guard flushes buffered lines when dropped, so the caller must
/// hold it until the program exits.
pub fn init_tracing(settings: &LoggingSettings) -> Result<WorkerGuard, ConfigError> {
    std::fs::create_dir_all(&settings.directory).map_err(|e| {
        ConfigError::LoggingError(format!(
            "cannot create log directory {}: {e}",
            settings.directory.display()
        ))
    })?;

    let appender = tracing_appender::rolling::never(&settings.directory, &settings.file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| {
            ConfigError::LoggingError(format!("invalid level '{}': {e}", settings.level))
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTime::rfc_3339())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    Ok(guard)
}
