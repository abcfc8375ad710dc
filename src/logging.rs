use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

const LOG_FILE_NAME: &str = "engagement-board.log";

/// Install the process-wide subscriber for the long-running server.
///
/// `RUST_LOG` wins over the configured level. File logging is enabled when
/// `ENGAGEMENT_LOG_DIR` or `logging.dir` names a writable directory.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},hyper=warn,reqwest=warn", config.level)));

    let log_dir = std::env::var_os("ENGAGEMENT_LOG_DIR")
        .map(PathBuf::from)
        .or_else(|| config.dir.clone());

    // `rolling::daily` panics if it cannot create the first file, so check
    // writability before handing it the directory.
    let file_layer = log_dir.as_deref().and_then(|dir| match preflight(dir) {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Keep the guard alive for the life of the process
            Box::leak(Box::new(guard));

            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true),
            )
        }
        Err(e) => {
            eprintln!(
                "Warning: could not write to log directory {} ({}), file logging disabled",
                dir.display(),
                e
            );
            None
        }
    });

    let (json_layer, text_layer) = if config.json {
        (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_target(true),
            ),
            None,
        )
    } else {
        (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            ),
        )
    };

    let file_logging_enabled = file_layer.is_some();
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed && file_logging_enabled {
        if let Some(dir) = log_dir {
            eprintln!("Logging to: {}", dir.join(LOG_FILE_NAME).display());
        }
    }
}

fn preflight(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let marker = dir.join(".engagement_write_test");
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&marker)?;
    let _ = std::fs::remove_file(&marker);
    Ok(())
}

/// Minimal logging for one-shot CLI commands
pub fn init_logging_simple() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .try_init();
}
