/// Structured logging setup using tracing
///
/// Writes to stderr ONLY (never stdout); stdout is reserved for command
/// output such as the JSON result set printed by `kindred suggest`.
/// Auto-detects format: human-readable with ANSI colors when stderr is a
/// terminal, structured JSON when piped/redirected.

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing_subscriber::{
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};
use crate::config::Config;

/// Initialize the tracing subscriber with stderr-only output
///
/// Format auto-detection:
/// - Terminal: human-readable with ANSI colors
/// - Pipe/redirect: structured JSON
///
/// Log level from config.log_level (default: info);
/// RUST_LOG env var can override at runtime.
/// When config.log_file is set, a JSON layer additionally appends to that file.
pub fn init_logging(config: &Config) {
    // Build env filter from config, with RUST_LOG override
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // Optional append-mode file layer, always JSON
    let file_layer = config.log_file.as_ref().and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false)
                    .json(),
            ),
            Err(e) => {
                eprintln!("kindred: cannot open log file {}: {}", path, e);
                None
            }
        }
    });

    // Auto-detect format based on stderr terminal status
    let stderr_is_terminal = std::io::stderr().is_terminal();

    // Boxed so both formats have one type and can share the stack below
    let stderr_layer = if stderr_is_terminal {
        // Human-readable format with ANSI colors for terminal
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .boxed()
    } else {
        // Structured JSON format for pipes/redirects
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
}
