//! Line-wise URL input from a file or stdin.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use anyhow::{Context, Result};

use urlsmith_core::diag;

/// Longest accepted input line; longer lines are skipped with a note.
const MAX_LINE: usize = 4096;

/// Opens the URL source: a path, or `-` for stdin.
pub fn open(path: &str, quiet: bool) -> Result<Box<dyn Iterator<Item = String>>> {
    if path == "-" {
        Ok(Box::new(lines(BufReader::new(io::stdin()), quiet)))
    } else {
        let file = File::open(path).with_context(|| format!("--url-file {path} not found"))?;
        Ok(Box::new(lines(BufReader::new(file), quiet)))
    }
}

/// Empty lines are skipped, trailing whitespace (and a CR from CRLF
/// input) is trimmed, and overlong lines are dropped with a note.
fn lines<R: BufRead + 'static>(reader: R, quiet: bool) -> impl Iterator<Item = String> {
    reader.lines().filter_map(move |line| {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                diag::note(quiet, &format!("read error: {e}"));
                return None;
            }
        };
        if line.len() > MAX_LINE {
            diag::note(quiet, "skipping long line");
            return None;
        }
        let trimmed = line.trim_end_matches(['\r', ' ', '\t']);
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
