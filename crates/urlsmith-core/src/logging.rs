//! Logging init: file under the XDG state dir, stderr when unavailable.

use std::fs;
use std::io;

use tracing_subscriber::EnvFilter;

/// Initialize tracing to `~/.local/state/urlsmith/urlsmith.log`. If the
/// state dir cannot be used, log to stderr instead; a CLI filter must
/// keep working without a writable home.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,urlsmith_core=debug,urlsmith_cli=debug"));

    match open_log_file() {
        Some(file) => {
            let writer = move || -> Box<dyn io::Write> {
                match file.try_clone() {
                    Ok(clone) => Box::new(clone),
                    Err(_) => Box::new(io::stderr()),
                }
            };
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            tracing::debug!("urlsmith logging initialized");
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .with_ansi(false)
                .init();
        }
    }
}

/// Opens the append-mode log file under the XDG state dir.
fn open_log_file() -> Option<fs::File> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("urlsmith").ok()?;
    let log_dir = xdg_dirs.get_state_home();
    fs::create_dir_all(&log_dir).ok()?;
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("urlsmith.log"))
        .ok()
}
