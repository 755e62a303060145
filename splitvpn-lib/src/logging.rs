use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub type FileFmtLayer =
    fmt::Layer<tracing_subscriber::Registry, fmt::format::DefaultFields, fmt::format::Format, BoxMakeWriter>;

const DEFAULT_LOG_FILTER: &str = "info";
pub const ENV_VAR_LOG_FILE: &str = "SPLITVPN_LOG_FILE";

/// Creates a formatting layer appending to `log_path` without ANSI colors.
pub fn make_file_fmt_layer(log_path: &Path) -> io::Result<FileFmtLayer> {
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;
    Ok(fmt::layer().with_writer(BoxMakeWriter::new(file)).with_ansi(false))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Initializes the global `tracing` subscriber writing to `log_path`.
///
/// Verbosity comes from `RUST_LOG` and defaults to `info`.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn setup_log_file(log_path: &Path) -> io::Result<()> {
    let layer = make_file_fmt_layer(log_path)?;
    tracing_subscriber::registry().with(layer).with(env_filter()).init();
    tracing::debug!("logging initialized with file output: {}", log_path.display());
    Ok(())
}

/// Initializes the global `tracing` subscriber writing to stderr.
///
/// Stdout stays reserved for command output.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn setup_stderr() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_ansi(true))
        .with(env_filter())
        .init();
    tracing::debug!("logging initialized with stderr output");
}
