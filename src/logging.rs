//! Logging setup: stderr plus an optional log file.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

fn env_filter() -> EnvFilter {
  EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging.
///
/// Both outputs use the level from RUST_LOG, defaulting to "info". Stdout is
/// left for command output. Keep the returned guard alive until exit so the
/// file writer flushes.
pub fn init(file: Option<&Path>) -> Option<WorkerGuard> {
  let stderr = tracing_subscriber::fmt::layer()
    .with_writer(std::io::stderr)
    .with_filter(env_filter());

  let Some(path) = file else {
    tracing_subscriber::registry().with(stderr).init();
    return None;
  };

  let directory = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or_else(|| Path::new("."));
  let file_name = path
    .file_name()
    .map(|name| name.to_os_string())
    .unwrap_or_else(|| "plate-cache.log".into());

  let file_appender = tracing_appender::rolling::never(directory, file_name);
  let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

  tracing_subscriber::registry()
    .with(stderr)
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(env_filter()),
    )
    .init();

  Some(guard)
}
