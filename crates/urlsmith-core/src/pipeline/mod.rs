//! Per-URL processing: parse, expand iterations, transform the query,
//! write it back, emit exactly one output per resulting URL.

mod iterate;

pub use iterate::{Binding, IterateSpec};

use std::io::Write;

use anyhow::Result;

use crate::accessor::{ParseOptions, UrlComponent, UrlHandle};
use crate::codec;
use crate::diag;
use crate::format::{self, OutputOptions};
use crate::json;
use crate::query::QueryStore;

/// One `--set component[:]=value` assignment, already validated.
#[derive(Debug, Clone)]
pub struct SetSpec {
    pub component: UrlComponent,
    pub value: String,
    pub encode: bool,
}

/// One `--replace`/`--force-replace` directive.
#[derive(Debug, Clone)]
pub struct ReplaceSpec {
    /// `key[=value]`.
    pub spec: String,
    /// Append the pair when the key is missing.
    pub force: bool,
}

/// Everything one invocation needs to process candidate URLs.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub separator: char,
    pub json: bool,
    /// `--get` template; mutually exclusive with `json`.
    pub format: Option<String>,
    pub sort_query: bool,
    pub urlencode: bool,
    pub default_port: bool,
    pub punycode: bool,
    pub as_idn: bool,
    pub quiet: bool,
    pub verify: bool,
    pub no_guess_scheme: bool,
    pub accept_space: bool,
    pub redirect: Option<String>,
    pub set_list: Vec<SetSpec>,
    pub trim_patterns: Vec<String>,
    pub replacements: Vec<ReplaceSpec>,
    pub append_query: Vec<String>,
    pub append_path: Vec<String>,
    pub iterate: Vec<IterateSpec>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            separator: '&',
            json: false,
            format: None,
            sort_query: false,
            urlencode: false,
            default_port: false,
            punycode: false,
            as_idn: false,
            quiet: false,
            verify: false,
            no_guess_scheme: false,
            accept_space: false,
            redirect: None,
            set_list: Vec::new(),
            trim_patterns: Vec::new(),
            replacements: Vec::new(),
            append_query: Vec::new(),
            append_path: Vec::new(),
            iterate: Vec::new(),
        }
    }
}

impl ProcessOptions {
    fn output_options(&self) -> OutputOptions {
        OutputOptions {
            urlencode: self.urlencode,
            default_port: self.default_port,
            punycode: self.punycode,
            as_idn: self.as_idn,
            quiet: self.quiet,
        }
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            no_guess_scheme: self.no_guess_scheme,
            accept_space: self.accept_space,
        }
    }
}

/// Processes one candidate URL. Returns how many outputs were written
/// (one per iterate combination) so the caller can frame a JSON batch.
/// A URL that cannot be parsed is a note and yields zero outputs,
/// unless `--verify` makes it fatal.
pub fn process_url(
    opts: &ProcessOptions,
    raw: &str,
    emitted_before: usize,
    out: &mut impl Write,
) -> Result<usize> {
    let mut base = match UrlHandle::parse(raw, &opts.parse_options()) {
        Ok(handle) => handle,
        Err(e) => {
            if opts.verify {
                return Err(anyhow::anyhow!("{e}"));
            }
            diag::note(opts.quiet, &e.to_string());
            return Ok(0);
        }
    };
    if let Some(target) = &opts.redirect {
        if let Err(e) = base.redirect(target) {
            if opts.verify {
                return Err(anyhow::anyhow!("invalid redirection: {e}"));
            }
            diag::note(opts.quiet, &format!("invalid redirection: {e}"));
            return Ok(0);
        }
    }

    let mut emitted = 0;
    for bindings in iterate::combinations(&opts.iterate) {
        let mut handle = base.clone();
        for set in &opts.set_list {
            if let Err(e) = handle.set(set.component, &set.value, set.encode) {
                diag::note(opts.quiet, &format!("error setting {}: {e}", set.component.name()));
            }
        }
        for binding in &bindings {
            binding.apply(&mut handle, opts.quiet);
        }
        process_single(opts, handle, emitted_before + emitted, out)?;
        emitted += 1;
    }
    Ok(emitted)
}

/// Applies the query operations to a bare query string. Returns the
/// rewritten string when anything changed, plus the change flag.
pub fn process_query(query: &str, opts: &ProcessOptions) -> (Option<String>, bool) {
    let store = transformed_store(opts, query);
    let modified = store.is_modified();
    (modified.then(|| store.join()), modified)
}

/// Runs the transform pipeline in its fixed order:
/// trim, replace, append, sort.
fn transformed_store(opts: &ProcessOptions, query: &str) -> QueryStore {
    let mut store = QueryStore::extract(query, opts.separator, opts.json, opts.quiet);
    for pattern in &opts.trim_patterns {
        store.trim(pattern);
    }
    for replace in &opts.replacements {
        store.replace(&replace.spec, replace.force);
    }
    for pair in &opts.append_query {
        store.append(pair);
    }
    if opts.sort_query {
        store.sort_pairs();
    }
    store
}

/// One fully-bound URL: append path segments, rewrite the query if
/// anything changed, then emit through exactly one output path.
fn process_single(
    opts: &ProcessOptions,
    mut handle: UrlHandle,
    emitted_before: usize,
    out: &mut impl Write,
) -> Result<()> {
    append_path_segments(opts, &mut handle);

    let raw_query = handle.raw_query().unwrap_or("").to_string();
    let store = transformed_store(opts, &raw_query);

    if store.is_modified() {
        let joined = store.join();
        if joined.is_empty() {
            handle.set_raw_query(None);
        } else {
            handle.set_raw_query(Some(&joined));
        }
    }

    let output_opts = opts.output_options();
    let mut buf = Vec::new();
    if opts.json {
        json::render_json(&handle, &store, &output_opts, emitted_before == 0, &mut buf);
    } else if let Some(template) = &opts.format {
        format::render(template, &handle, &store, &output_opts, &mut buf)?;
    } else {
        buf.extend_from_slice(handle.as_str().as_bytes());
        buf.push(b'\n');
    }
    out.write_all(&buf)?;
    Ok(())
}

/// Appends `--append path=` segments, inserting `/` unless the current
/// path already ends with one.
fn append_path_segments(opts: &ProcessOptions, handle: &mut UrlHandle) {
    for segment in &opts.append_path {
        let encoded = codec::encode_path(segment.as_bytes());
        let mut next = handle.raw_path().to_string();
        if !next.ends_with('/') {
            next.push('/');
        }
        next.push_str(&encoded);
        handle.set_raw_path(&next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ProcessOptions {
        ProcessOptions {
            quiet: true,
            ..Default::default()
        }
    }

    fn run(options: &ProcessOptions, url: &str) -> String {
        let mut out = Vec::new();
        process_url(options, url, 0, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn plain_echo_normalizes() {
        assert_eq!(run(&opts(), "example.com"), "http://example.com/\n");
    }

    #[test]
    fn untouched_query_not_rewritten() {
        assert_eq!(
            run(&opts(), "https://example.com/?b=2&a=1"),
            "https://example.com/?b=2&a=1\n"
        );
    }

    #[test]
    fn noncanonical_query_rewritten_on_ingest() {
        assert_eq!(
            run(&opts(), "https://example.com/?a=%3a"),
            "https://example.com/?a=%3A\n"
        );
    }

    #[test]
    fn trim_rewrites_query() {
        let options = ProcessOptions {
            trim_patterns: vec!["utm_*".into()],
            ..opts()
        };
        assert_eq!(
            run(&options, "https://example.com/?a=1&utm_source=x&utm_medium=y&b=2"),
            "https://example.com/?a=1&b=2\n"
        );
    }

    #[test]
    fn trim_everything_drops_query() {
        let options = ProcessOptions {
            trim_patterns: vec!["*".into()],
            ..opts()
        };
        assert_eq!(
            run(&options, "https://example.com/?a=1&b=2"),
            "https://example.com/\n"
        );
    }

    #[test]
    fn replace_and_sort_compose() {
        let options = ProcessOptions {
            replacements: vec![ReplaceSpec {
                spec: "a=9".into(),
                force: false,
            }],
            sort_query: true,
            ..opts()
        };
        assert_eq!(
            run(&options, "https://example.com/?b=2&a=1&a=0"),
            "https://example.com/?a=9&b=2\n"
        );
    }

    #[test]
    fn force_replace_appends_missing_key() {
        let options = ProcessOptions {
            replacements: vec![ReplaceSpec {
                spec: "a=9".into(),
                force: true,
            }],
            ..opts()
        };
        assert_eq!(
            run(&options, "https://example.com/?b=1"),
            "https://example.com/?b=1&a=9\n"
        );
    }

    #[test]
    fn append_query_pair() {
        let options = ProcessOptions {
            append_query: vec!["search=string".into()],
            ..opts()
        };
        assert_eq!(
            run(&options, "https://curl.se?name=hello"),
            "https://curl.se/?name=hello&search=string\n"
        );
    }

    #[test]
    fn append_path_segment() {
        let options = ProcessOptions {
            append_path: vec!["you".into()],
            ..opts()
        };
        assert_eq!(run(&options, "https://curl.se/hello"), "https://curl.se/hello/you\n");
        assert_eq!(run(&options, "localhost"), "http://localhost/you\n");
    }

    #[test]
    fn redirect_applies_before_everything() {
        let options = ProcessOptions {
            redirect: Some("here.html".into()),
            ..opts()
        };
        assert_eq!(
            run(&options, "https://curl.se/we/are.html"),
            "https://curl.se/we/here.html\n"
        );
    }

    #[test]
    fn set_changes_component() {
        let options = ProcessOptions {
            set_list: vec![SetSpec {
                component: UrlComponent::Host,
                value: "example.com".into(),
                encode: true,
            }],
            ..opts()
        };
        assert_eq!(run(&options, "https://curl.se"), "https://example.com/\n");
    }

    #[test]
    fn iterate_emits_all_combinations() {
        let options = ProcessOptions {
            iterate: vec![IterateSpec {
                component: UrlComponent::Port,
                encode: true,
                values: vec!["80".into(), "81".into()],
            }],
            ..opts()
        };
        assert_eq!(
            run(&options, "https://example.com/"),
            "https://example.com:80/\nhttps://example.com:81/\n"
        );
    }

    #[test]
    fn iterate_combinations_do_not_bleed() {
        // each combination starts from the pristine base, so a trim in
        // one pass cannot affect the next
        let options = ProcessOptions {
            iterate: vec![IterateSpec {
                component: UrlComponent::Host,
                encode: true,
                values: vec!["a.se".into(), "b.se".into()],
            }],
            trim_patterns: vec!["x".into()],
            ..opts()
        };
        assert_eq!(
            run(&options, "https://example.com/?x=1&y=2"),
            "https://a.se/?y=2\nhttps://b.se/?y=2\n"
        );
    }

    #[test]
    fn bad_url_is_skipped_without_verify() {
        let options = opts();
        let mut out = Vec::new();
        let n = process_url(&options, "https://exa mple.com/", 0, &mut out).unwrap();
        assert_eq!(n, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn bad_url_is_fatal_with_verify() {
        let options = ProcessOptions {
            verify: true,
            ..opts()
        };
        let mut out = Vec::new();
        assert!(process_url(&options, "https://exa mple.com/", 0, &mut out).is_err());
    }

    #[test]
    fn process_query_reports_changes() {
        let options = ProcessOptions {
            trim_patterns: vec!["b".into()],
            ..opts()
        };
        let (rewritten, modified) = process_query("a=1&b=2", &options);
        assert!(modified);
        assert_eq!(rewritten.as_deref(), Some("a=1"));

        let untouched = process_query("a=1&b=2", &opts());
        assert_eq!(untouched, (None, false));
    }
}
