//! Logging Infrastructure
//!
//! `RUST_LOG` wins when set; otherwise `log_level` applies to this crate,
//! `shared` and `tower_http`. With a log directory, output goes to a daily
//! rolling file through a non-blocking writer whose guard must be kept alive.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the global subscriber
///
/// `json` switches to one JSON object per line (production).
pub fn init_logger(log_level: &str, json: bool, log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tab_server={log_level},shared={log_level},tower_http={log_level},security={log_level}"
        ))
    });

    let (writer, guard) = match log_dir {
        Some(dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, "tab-server");
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                (BoxMakeWriter::new(non_blocking), Some(guard))
            }
            Err(e) => {
                eprintln!("Cannot create log directory {dir}: {e}; logging to stdout");
                (BoxMakeWriter::new(std::io::stdout), None)
            }
        },
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };

    let fmt_layer = if json {
        fmt::layer().json().with_writer(writer).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(writer)
            .boxed()
    };

    // A subscriber may already be installed (tests)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();

    guard
}
