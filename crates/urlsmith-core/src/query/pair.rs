//! A single `key[=value]` query pair, held in two parallel forms.

use crate::codec;
use crate::diag;

/// Sentinel replacing embedded NUL bytes in decoded values meant for
/// human display; JSON output keeps the raw byte.
const NUL_SENTINEL: u8 = b'.';

/// One query pair: canonical percent-encoded form plus fully decoded
/// form. Both forms always describe the same logical key/value. A
/// tombstoned pair has both forms empty but keeps its slot so the
/// positional order of survivors is preserved.
#[derive(Debug, Clone, Default)]
pub struct QueryPair {
    /// Canonical encoding (`+` for space, uppercase hex). ASCII except
    /// when a malformed escape forced a raw passthrough.
    pub encoded: String,
    /// Percent-decoded bytes; may contain NUL and non-UTF-8 bytes.
    pub decoded: Vec<u8>,
}

impl QueryPair {
    /// Builds both forms from a raw query segment. Returns the pair and
    /// whether the canonical encoding differs from the raw input.
    pub(crate) fn build(raw: &str, json_mode: bool, quiet: bool) -> (Self, bool) {
        let raw_bytes = raw.as_bytes();
        let (key_raw, val_raw) = match raw.find('=') {
            Some(idx) => (&raw_bytes[..idx], Some(&raw_bytes[idx + 1..])),
            None => (raw_bytes, None),
        };

        let (mut encoded, mut decoded) = canonicalize_side(key_raw, quiet);
        if let Some(val_raw) = val_raw {
            let (val_enc, mut val_dec) = canonicalize_side(val_raw, quiet);
            if !json_mode {
                for b in val_dec.iter_mut() {
                    if *b == 0 {
                        *b = NUL_SENTINEL;
                    }
                }
            }
            encoded.push('=');
            encoded.push_str(&val_enc);
            decoded.push(b'=');
            decoded.append(&mut val_dec);
        }
        let modified = encoded.as_bytes() != raw_bytes;
        (Self { encoded, decoded }, modified)
    }

    pub fn is_live(&self) -> bool {
        !self.encoded.is_empty()
    }

    /// Marks the pair deleted without freeing its slot.
    pub fn tombstone(&mut self) {
        self.encoded.clear();
        self.decoded.clear();
    }

    /// The key portion of the encoded form: everything before the first
    /// `=`, or the whole pair for a bare key.
    pub fn key_encoded(&self) -> &str {
        match self.encoded.find('=') {
            Some(i) => &self.encoded[..i],
            None => &self.encoded,
        }
    }
}

/// Decode-then-reencode one side of a pair. A malformed escape keeps the
/// raw bytes in both forms (see DESIGN.md).
fn canonicalize_side(raw: &[u8], quiet: bool) -> (String, Vec<u8>) {
    match codec::decode_query(raw) {
        Ok(dec) => (codec::encode_query(&dec), dec),
        Err(e) => {
            diag::note(quiet, &format!("bad percent escape in query pair ({e}), passed through"));
            (String::from_utf8_lossy(raw).into_owned(), raw.to_vec())
        }
    }
}
