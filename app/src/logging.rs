use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Log to stderr and a daily rolling file in `dir`. Keep the guard alive
/// for as long as logs should be flushed.
pub fn init(dir: &Path, file_name: &str, level: &str, debug_console: bool) -> Option<WorkerGuard> {
    #[cfg(feature = "tokio-console")]
    if debug_console {
        console_subscriber::init();
        return None;
    }
    #[cfg(not(feature = "tokio-console"))]
    if debug_console {
        eprintln!("debug_console requires the tokio-console feature; using plain logging");
    }

    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Cannot create log directory {}: {}", dir.display(), e);
    }
    let file_appender = rolling::daily(dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr.and(file_writer))
        .init();
    Some(guard)
}
