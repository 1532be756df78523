//! JSON output: one object per URL with the recomposed URL, every
//! retrievable component, and the live query pairs.
//!
//! The emitter is byte-oriented on purpose: decoded values can carry
//! arbitrary octets, and components are fetched encoded then decoded
//! with our own codec so the accessor's decoding policy can never
//! corrupt the structure.

use crate::accessor::{GetFlags, UrlComponent, UrlHandle};
use crate::codec;
use crate::format::OutputOptions;
use crate::query::QueryStore;

/// Appends `bytes` as a JSON string literal. Control bytes below 0x20
/// become `\u00XX`; everything from 0x20 up passes through untouched.
fn json_string(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(b'"');
    for &b in bytes {
        match b {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'"' => out.extend_from_slice(b"\\\""),
            0x08 => out.extend_from_slice(b"\\b"),
            0x0c => out.extend_from_slice(b"\\f"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            b if b < 0x20 => {
                out.extend_from_slice(format!("\\u{:04x}", b).as_bytes());
            }
            b => out.push(b),
        }
    }
    out.push(b'"');
}

/// Appends one JSON object for the URL. `first` controls the separator
/// between batch entries; the caller owns the surrounding `[` and `]`.
pub fn render_json(
    url: &UrlHandle,
    store: &QueryStore,
    opts: &OutputOptions,
    first: bool,
    out: &mut Vec<u8>,
) {
    let flags = GetFlags {
        urlencoded: true,
        default_port: opts.default_port,
        punycode: opts.punycode,
        as_idn: opts.as_idn,
    };

    if !first {
        out.push(b',');
    }
    out.extend_from_slice(b"\n  {\n    \"url\": ");
    let full = url.get(UrlComponent::Url, &flags).unwrap_or_default();
    json_string(out, &full);

    out.extend_from_slice(b",\n    \"parts\": {\n");
    let mut first_part = true;
    for component in UrlComponent::ALL {
        let Ok(raw) = url.get(component, &flags) else {
            continue;
        };
        let value = if opts.urlencode {
            raw
        } else {
            decode_part(component, &raw)
        };
        if !first_part {
            out.extend_from_slice(b",\n");
        }
        first_part = false;
        out.extend_from_slice(b"      \"");
        out.extend_from_slice(component.name().as_bytes());
        out.extend_from_slice(b"\": ");
        json_string(out, &value);
    }
    out.extend_from_slice(b"\n    }");

    if store.live_pairs().next().is_some() {
        out.extend_from_slice(b",\n    \"params\": [\n");
        let mut first_pair = true;
        for pair in store.live_pairs() {
            let (key, value) = split_decoded(&pair.decoded);
            if !first_pair {
                out.extend_from_slice(b",\n");
            }
            first_pair = false;
            out.extend_from_slice(b"      {\n        \"key\": ");
            json_string(out, key);
            out.extend_from_slice(b",\n        \"value\": ");
            json_string(out, value);
            out.extend_from_slice(b"\n      }");
        }
        out.extend_from_slice(b"\n    ]");
    }
    out.extend_from_slice(b"\n  }");
}

fn decode_part(component: UrlComponent, raw: &[u8]) -> Vec<u8> {
    let decoded = match component {
        UrlComponent::Query => codec::decode_query(raw),
        _ => codec::decode_plain(raw),
    };
    decoded.unwrap_or_else(|_| raw.to_vec())
}

/// Splits a decoded pair on its first `=`; the value defaults to empty.
fn split_decoded(decoded: &[u8]) -> (&[u8], &[u8]) {
    match decoded.iter().position(|&b| b == b'=') {
        Some(i) => (&decoded[..i], &decoded[i + 1..]),
        None => (decoded, &decoded[..0]),
    }
}
