//! The output format-string interpreter.
//!
//! `--get` templates mix literal text, backslash escapes, and component
//! references in `{}` or `[]`: `{host}`, `{default:port}`,
//! `{query:name}`, `{must:zoneid}`. The delimiter pair is chosen by the
//! first unescaped delimiter and stays fixed for the rest of the
//! template; a doubled delimiter (`{{`) emits one literal delimiter.

use std::fmt;

use crate::accessor::{GetError, GetFlags, UrlComponent, UrlHandle};
use crate::diag;
use crate::query::QueryStore;

/// Modifier set for one component reference.
#[derive(Debug, Clone, Copy, Default)]
struct Modifiers {
    urlencoded: bool,
    default_port: bool,
    punycode: bool,
    as_idn: bool,
    must_exist: bool,
    strict: bool,
}

/// Fatal template errors; anything recoverable is a note instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// `puny:` and `idn:` on the same reference.
    ConflictingModifiers,
    /// A `word:` prefix that is no known modifier or query form, or an
    /// empty component name.
    BadSyntax(String),
    /// An unknown component name inside a reference.
    UnknownComponent(String),
    /// `must:` on a component the URL does not have.
    MissingComponent(&'static str),
    /// `strict:` escalated an accessor failure.
    Strict(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::ConflictingModifiers => {
                write!(f, "puny modifier is mutually exclusive with idn")
            }
            FormatError::BadSyntax(body) => write!(f, "bad --get syntax: {body}"),
            FormatError::UnknownComponent(name) => {
                write!(f, "\"{name}\" is not a recognized URL component")
            }
            FormatError::MissingComponent(name) => write!(f, "no {name} in this URL"),
            FormatError::Strict(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for FormatError {}

/// Global output switches shared by every reference in the template.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub urlencode: bool,
    pub default_port: bool,
    pub punycode: bool,
    pub as_idn: bool,
    pub quiet: bool,
}

/// Renders `template` into `out`, consulting the URL handle and the
/// query store. A trailing newline is always appended. An unterminated
/// reference emits the opening delimiter literally and scanning
/// continues (see DESIGN.md).
pub fn render(
    template: &str,
    url: &UrlHandle,
    store: &QueryStore,
    opts: &OutputOptions,
    out: &mut Vec<u8>,
) -> Result<(), FormatError> {
    let bytes = template.as_bytes();
    let mut open: u8 = 0;
    let mut close: u8 = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if open == 0 && (b == b'{' || b == b'[') {
            open = b;
            close = if b == b'{' { b'}' } else { b']' };
        }
        if open != 0 && b == open {
            if bytes.get(i + 1) == Some(&open) {
                out.push(open);
                i += 2;
                continue;
            }
            let Some(len) = bytes[i + 1..].iter().position(|&c| c == close) else {
                out.push(open);
                i += 1;
                continue;
            };
            let body = &template[i + 1..i + 1 + len];
            emit_reference(body, url, store, opts, out)?;
            i += len + 2;
        } else if b == b'\\' && i + 1 < bytes.len() {
            match bytes[i + 1] {
                b'r' => out.push(b'\r'),
                b'n' => out.push(b'\n'),
                b't' => out.push(b'\t'),
                b'\\' => out.push(b'\\'),
                b'{' => out.push(b'{'),
                b'[' => out.push(b'['),
                b'}' => out.push(b'}'),
                b']' => out.push(b']'),
                other => {
                    out.push(b'\\');
                    out.push(other);
                }
            }
            i += 2;
        } else {
            out.push(b);
            i += 1;
        }
    }
    out.push(b'\n');
    Ok(())
}

/// Evaluates one reference body: modifiers, then a query lookup or a
/// component fetch.
fn emit_reference(
    body: &str,
    url: &UrlHandle,
    store: &QueryStore,
    opts: &OutputOptions,
    out: &mut Vec<u8>,
) -> Result<(), FormatError> {
    let mut mods = Modifiers {
        urlencoded: opts.urlencode,
        default_port: opts.default_port,
        punycode: opts.punycode,
        as_idn: opts.as_idn,
        ..Default::default()
    };
    let mut saw_puny = false;
    let mut saw_idn = false;

    let mut rest = body;
    if let Some(stripped) = rest.strip_prefix(':') {
        mods.urlencoded = true;
        rest = stripped;
    }

    while let Some(colon) = rest.find(':') {
        match &rest[..colon] {
            "url" => mods.urlencoded = true,
            "default" => mods.default_port = true,
            "puny" => {
                if saw_idn {
                    return Err(FormatError::ConflictingModifiers);
                }
                saw_puny = true;
                mods.punycode = true;
                mods.as_idn = false;
            }
            "idn" => {
                if saw_puny {
                    return Err(FormatError::ConflictingModifiers);
                }
                saw_idn = true;
                mods.as_idn = true;
                mods.punycode = false;
            }
            "strict" => mods.strict = true,
            "must" => mods.must_exist = true,
            word @ ("query" | "query-all") => {
                let key = &rest[colon + 1..];
                emit_query_values(key, word == "query-all", &mods, store, out);
                return Ok(());
            }
            _ => return Err(FormatError::BadSyntax(body.to_string())),
        }
        rest = &rest[colon + 1..];
    }

    if rest.is_empty() {
        return Err(FormatError::BadSyntax(body.to_string()));
    }
    let Some(component) = UrlComponent::from_name(rest) else {
        return Err(FormatError::UnknownComponent(rest.to_string()));
    };

    let flags = GetFlags {
        urlencoded: mods.urlencoded,
        default_port: mods.default_port,
        punycode: mods.punycode,
        as_idn: mods.as_idn,
    };
    match url.get(component, &flags) {
        Ok(value) => out.extend_from_slice(&value),
        Err(GetError::Absent(_)) => {
            if mods.must_exist {
                return Err(FormatError::MissingComponent(component.name()));
            }
        }
        Err(err) => {
            if mods.strict {
                return Err(FormatError::Strict(err.to_string()));
            }
            diag::note(opts.quiet, &err.to_string());
            // fall back to the stored form (e.g. punycode host)
            let fallback = GetFlags {
                as_idn: false,
                ..flags
            };
            if let Ok(value) = url.get(component, &fallback) {
                out.extend_from_slice(&value);
            }
        }
    }
    Ok(())
}

/// Writes the first (or, space-joined, every) value stored under `key`.
fn emit_query_values(
    key: &str,
    all: bool,
    mods: &Modifiers,
    store: &QueryStore,
    out: &mut Vec<u8>,
) {
    let decoded = !mods.urlencoded;
    let mut shown = false;
    for value in store.values_for_key(key.as_bytes(), decoded) {
        if shown {
            out.push(b' ');
        }
        out.extend_from_slice(value);
        if !all {
            return;
        }
        shown = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::ParseOptions;

    fn handle(raw: &str) -> UrlHandle {
        UrlHandle::parse(raw, &ParseOptions::default()).unwrap()
    }

    fn render_ok(template: &str, url: &str, query: &str) -> String {
        let h = handle(url);
        let store = QueryStore::extract(query, '&', false, true);
        let mut out = Vec::new();
        render(
            template,
            &h,
            &store,
            &OutputOptions {
                quiet: true,
                ..Default::default()
            },
            &mut out,
        )
        .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn render_err(template: &str, url: &str, query: &str) -> FormatError {
        let h = handle(url);
        let store = QueryStore::extract(query, '&', false, true);
        let mut out = Vec::new();
        render(
            template,
            &h,
            &store,
            &OutputOptions {
                quiet: true,
                ..Default::default()
            },
            &mut out,
        )
        .unwrap_err()
    }

    #[test]
    fn literal_text_passes_through() {
        assert_eq!(render_ok("plain text", "http://x.se/", ""), "plain text\n");
    }

    #[test]
    fn components_are_substituted() {
        assert_eq!(
            render_ok("{scheme} {host} {path}", "https://example.com/a/b", ""),
            "https example.com /a/b\n"
        );
    }

    #[test]
    fn bracket_delimiters_work_too() {
        assert_eq!(render_ok("[host]", "https://example.com/", ""), "example.com\n");
    }

    #[test]
    fn first_delimiter_fixes_the_pair() {
        // once `[` is chosen, `{` is literal text
        assert_eq!(
            render_ok("[host] {host}", "https://example.com/", ""),
            "example.com {host}\n"
        );
    }

    #[test]
    fn escaped_brackets_are_literal() {
        assert_eq!(render_ok("\\{literal\\}", "http://x.se/", ""), "{literal}\n");
    }

    #[test]
    fn doubled_delimiter_is_literal() {
        assert_eq!(render_ok("{{", "http://x.se/", ""), "{\n");
        // only the opening delimiter doubles; the closer stays literal
        assert_eq!(render_ok("{{host}}", "http://x.se/", ""), "{host}}\n");
    }

    #[test]
    fn escape_sequences() {
        assert_eq!(render_ok("a\\tb\\nc\\\\d", "http://x.se/", ""), "a\tb\nc\\d\n");
        // unknown escapes pass through untouched
        assert_eq!(render_ok("a\\qb", "http://x.se/", ""), "a\\qb\n");
    }

    #[test]
    fn unterminated_reference_is_tolerated() {
        assert_eq!(render_ok("{host", "https://example.com/", ""), "{host\n");
    }

    #[test]
    fn absent_component_emits_nothing() {
        assert_eq!(render_ok("<{fragment}>", "https://example.com/", ""), "<>\n");
    }

    #[test]
    fn must_modifier_is_fatal_on_absent() {
        assert_eq!(
            render_err("{must:zoneid}", "https://example.com/", ""),
            FormatError::MissingComponent("zoneid")
        );
        // without must, the same reference is silent
        assert_eq!(render_ok("{zoneid}", "https://example.com/", ""), "\n");
    }

    #[test]
    fn unknown_component_is_fatal() {
        assert_eq!(
            render_err("{bogus}", "https://example.com/", ""),
            FormatError::UnknownComponent("bogus".into())
        );
    }

    #[test]
    fn unknown_modifier_is_fatal() {
        assert!(matches!(
            render_err("{frob:host}", "https://example.com/", ""),
            FormatError::BadSyntax(_)
        ));
    }

    #[test]
    fn empty_component_is_fatal() {
        assert!(matches!(
            render_err("{default:}", "https://example.com/", ""),
            FormatError::BadSyntax(_)
        ));
    }

    #[test]
    fn puny_and_idn_conflict() {
        assert_eq!(
            render_err("{puny:idn:host}", "https://example.com/", ""),
            FormatError::ConflictingModifiers
        );
        assert_eq!(
            render_err("{idn:puny:host}", "https://example.com/", ""),
            FormatError::ConflictingModifiers
        );
    }

    #[test]
    fn default_port_modifier() {
        assert_eq!(render_ok("{port}", "https://example.com/", ""), "\n");
        assert_eq!(render_ok("{default:port}", "https://example.com/", ""), "443\n");
    }

    #[test]
    fn query_lookup_first_match() {
        assert_eq!(
            render_ok("{query:a}", "http://x.se/", "a=1&b=2&a=3"),
            "1\n"
        );
    }

    #[test]
    fn query_all_space_joined() {
        assert_eq!(
            render_ok("{query-all:a}", "http://x.se/", "a=1&b=2&a=3"),
            "1 3\n"
        );
    }

    #[test]
    fn query_lookup_decoded_by_default() {
        assert_eq!(render_ok("{query:a}", "http://x.se/", "a=x%20y"), "x y\n");
        assert_eq!(render_ok("{:query:a}", "http://x.se/", "a=x%20y"), "x+y\n");
    }

    #[test]
    fn query_lookup_without_match_is_silent() {
        assert_eq!(render_ok("<{query:zz}>", "http://x.se/", "a=1"), "<>\n");
    }

    #[test]
    fn url_reference_recomposes() {
        assert_eq!(
            render_ok("{url}", "https://example.com/moo", ""),
            "https://example.com/moo\n"
        );
    }

    #[test]
    fn urlencoded_modifier_keeps_escapes() {
        assert_eq!(
            render_ok("{path}", "https://example.com/a%20b", ""),
            "/a b\n"
        );
        assert_eq!(
            render_ok("{:path}", "https://example.com/a%20b", ""),
            "/a%20b\n"
        );
        assert_eq!(
            render_ok("{url:path}", "https://example.com/a%20b", ""),
            "/a%20b\n"
        );
    }

    #[test]
    fn idn_modifier_converts_host() {
        assert_eq!(
            render_ok("{idn:host}", "https://xn--rksmrgs-5wao1o.se/", ""),
            "r\u{e4}ksm\u{f6}rg\u{e5}s.se\n"
        );
    }
}
