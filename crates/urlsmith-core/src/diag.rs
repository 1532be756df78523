//! User-facing diagnostics.
//!
//! Notes go to stderr (stdout carries URLs/JSON only) and are mirrored
//! into the tracing log. `--quiet` suppresses the stderr copy.

/// Emits a `urlsmith note:` diagnostic unless quieted.
pub fn note(quiet: bool, msg: &str) {
    tracing::warn!("{msg}");
    if !quiet {
        eprintln!("urlsmith note: {msg}");
    }
}
