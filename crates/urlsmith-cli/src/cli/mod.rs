//! CLI for the urlsmith URL manipulation tool.

mod input;

use std::collections::HashSet;
use std::io::Write;

use anyhow::{bail, Result};
use clap::Parser;

use urlsmith_core::accessor::UrlComponent;
use urlsmith_core::config::{self, UrlsmithConfig};
use urlsmith_core::pipeline::{self, IterateSpec, ProcessOptions, ReplaceSpec, SetSpec};

/// Top-level CLI: `urlsmith [options] [URL…]`.
#[derive(Debug, Parser)]
#[command(name = "urlsmith")]
#[command(about = "urlsmith: parse, rewrite and reformat URLs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// URL(s) to work with.
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// URL to work with (repeatable; same as a positional URL).
    #[arg(long = "url", value_name = "URL")]
    pub url: Vec<String>,

    /// Read URLs line-wise from a file, or from stdin with `-`.
    #[arg(short = 'f', long = "url-file", value_name = "FILE")]
    pub url_file: Option<String>,

    /// Append data to a component: `path=SEGMENT` or `query=KEY=VALUE`.
    #[arg(short = 'a', long = "append", value_name = "COMPONENT=DATA")]
    pub append: Vec<String>,

    /// Set component content: `COMPONENT=DATA` (`COMPONENT:=DATA` skips encoding).
    #[arg(short = 's', long = "set", value_name = "COMPONENT=DATA")]
    pub set: Vec<String>,

    /// Create multiple outputs: `COMPONENT=VALUE1 VALUE2 …`.
    #[arg(long, value_name = "COMPONENT=LIST")]
    pub iterate: Vec<String>,

    /// Redirect the URL to this reference.
    #[arg(long, value_name = "URL")]
    pub redirect: Option<String>,

    /// Query pair separator, if something else than `&`.
    #[arg(long = "query-separator", value_name = "LETTER")]
    pub query_separator: Option<String>,

    /// Remove query pairs: `query=KEY` or `query=PREFIX*`.
    #[arg(long, value_name = "COMPONENT=WHAT")]
    pub trim: Vec<String>,

    /// Output according to this template instead of the full URL.
    #[arg(short = 'g', long = "get", value_name = "TEMPLATE", conflicts_with = "json")]
    pub get: Option<String>,

    /// Output the URL(s) as a JSON array.
    #[arg(long)]
    pub json: bool,

    /// Replace a query pair: `KEY[=VALUE]`.
    #[arg(long, value_name = "DATA")]
    pub replace: Vec<String>,

    /// Like --replace, but appends the pair when the key is missing.
    #[arg(long = "force-replace", value_name = "DATA")]
    pub force_replace: Vec<String>,

    /// Alpha-sort the query pairs.
    #[arg(long = "sort-query")]
    pub sort_query: bool,

    /// Output components URL-encoded instead of decoded.
    #[arg(long)]
    pub urlencode: bool,

    /// Fill in known scheme default ports.
    #[arg(long = "default-port")]
    pub default_port: bool,

    /// Show hostnames in punycode.
    #[arg(long, conflicts_with = "as_idn")]
    pub punycode: bool,

    /// Show punycoded hostnames as IDN.
    #[arg(long = "as-idn")]
    pub as_idn: bool,

    /// Require a scheme instead of guessing one.
    #[arg(long = "no-guess-scheme")]
    pub no_guess_scheme: bool,

    /// Percent-encode spaces instead of rejecting the URL.
    #[arg(long = "accept-space")]
    pub accept_space: bool,

    /// Exit with an error on the first bad URL.
    #[arg(long)]
    pub verify: bool,

    /// Suppress notes.
    #[arg(long)]
    pub quiet: bool,
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let (opts, urls) = cli.into_run(&cfg)?;
        run(&opts, urls)
    }

    /// Validates every flag into pipeline options plus the URL source.
    /// All fatal specifier errors surface here, before any output.
    fn into_run(self, cfg: &UrlsmithConfig) -> Result<(ProcessOptions, Box<dyn Iterator<Item = String>>)> {
        let separator = match &self.query_separator {
            Some(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => bail!("only single-letter query separators are supported"),
                }
            }
            None => cfg.separator()?,
        };

        let set_list: Vec<SetSpec> = self
            .set
            .iter()
            .map(|raw| parse_set(raw))
            .collect::<Result<_>>()?;
        let mut set_components = HashSet::new();
        for spec in &set_list {
            if !set_components.insert(spec.component) {
                bail!("duplicate --set for component {}", spec.component.name());
            }
        }

        let iterate: Vec<IterateSpec> = self
            .iterate
            .iter()
            .map(|raw| parse_iterate(raw))
            .collect::<Result<_>>()?;
        let mut iter_components = HashSet::new();
        for spec in &iterate {
            if !iter_components.insert(spec.component) {
                bail!("duplicate component for iterate: {}", spec.component.name());
            }
            if set_components.contains(&spec.component) {
                bail!(
                    "duplicate --iterate and --set for component {}",
                    spec.component.name()
                );
            }
        }

        let trim_patterns: Vec<String> = self
            .trim
            .iter()
            .map(|raw| match raw.strip_prefix("query=") {
                Some(pattern) => Ok(pattern.to_string()),
                None => bail!("unsupported trim component: {raw}"),
            })
            .collect::<Result<_>>()?;

        let mut append_path = Vec::new();
        let mut append_query = Vec::new();
        for raw in &self.append {
            if let Some(segment) = raw.strip_prefix("path=") {
                append_path.push(segment.to_string());
            } else if let Some(pair) = raw.strip_prefix("query=") {
                append_query.push(pair.to_string());
            } else {
                bail!("--append unsupported component: {raw}");
            }
        }

        let mut replacements: Vec<ReplaceSpec> = self
            .replace
            .iter()
            .map(|spec| ReplaceSpec {
                spec: spec.clone(),
                force: false,
            })
            .collect();
        replacements.extend(self.force_replace.iter().map(|spec| ReplaceSpec {
            spec: spec.clone(),
            force: true,
        }));

        let quiet = self.quiet || cfg.quiet;
        let opts = ProcessOptions {
            separator,
            json: self.json,
            format: self.get,
            sort_query: self.sort_query,
            urlencode: self.urlencode,
            default_port: self.default_port || cfg.default_port,
            punycode: self.punycode || (cfg.punycode && !self.as_idn),
            as_idn: self.as_idn,
            quiet,
            verify: self.verify,
            no_guess_scheme: self.no_guess_scheme,
            accept_space: self.accept_space,
            redirect: self.redirect,
            set_list,
            trim_patterns,
            replacements,
            append_query,
            append_path,
            iterate,
        };

        let urls: Box<dyn Iterator<Item = String>> = match self.url_file {
            Some(path) => input::open(&path, quiet)?,
            None => {
                let mut list = self.urls;
                list.extend(self.url);
                Box::new(list.into_iter())
            }
        };
        Ok((opts, urls))
    }
}

/// Processes every URL, owning the JSON batch framing. A fatal error
/// still closes the array before the run stops.
fn run(opts: &ProcessOptions, urls: impl Iterator<Item = String>) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut emitted = 0usize;
    let mut any_url = false;
    let mut fatal = None;

    if opts.json {
        out.write_all(b"[")?;
    }

    for url in urls {
        any_url = true;
        match pipeline::process_url(opts, &url, emitted, &mut out) {
            Ok(n) => emitted += n,
            Err(e) => {
                fatal = Some(e);
                break;
            }
        }
    }
    if !any_url && fatal.is_none() {
        fatal = Some(anyhow::anyhow!("not enough input for a URL"));
    }

    if opts.json {
        writeln!(out, "{}]", if emitted > 0 { "\n" } else { "" })?;
    }
    out.flush()?;

    match fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Parses `component[:]=value`; the `:` suffix passes the value through
/// verbatim, and an IPv6 literal disables encoding on its own.
fn parse_set(raw: &str) -> Result<SetSpec> {
    let Some(eq) = raw.find('=') else {
        bail!("invalid --set syntax: {raw}");
    };
    if eq == 0 {
        bail!("invalid --set syntax: {raw}");
    }
    let (mut name, value) = (&raw[..eq], &raw[eq + 1..]);
    let mut encode = true;
    if let Some(stripped) = name.strip_suffix(':') {
        name = stripped;
        encode = false;
    }
    let component = match UrlComponent::from_name(name) {
        Some(c) if c != UrlComponent::Url => c,
        _ => bail!("unknown component: {name}"),
    };
    if component == UrlComponent::Host && value.starts_with('[') {
        encode = false;
    }
    Ok(SetSpec {
        component,
        value: value.to_string(),
        encode,
    })
}

/// Parses `component[:]=value1 value2 …` for `--iterate`.
fn parse_iterate(raw: &str) -> Result<IterateSpec> {
    let Some(eq) = raw.find('=') else {
        bail!("wrong iterate syntax: {raw}");
    };
    if eq == 0 {
        bail!("wrong iterate syntax: {raw}");
    }
    let (mut name, list) = (&raw[..eq], &raw[eq + 1..]);
    let mut encode = true;
    if let Some(stripped) = name.strip_suffix(':') {
        name = stripped;
        encode = false;
    }
    let component = match UrlComponent::from_name(name) {
        Some(c) if c != UrlComponent::Url => c,
        _ => bail!("bad component for iterate: {name}"),
    };
    let values: Vec<String> = list
        .split(' ')
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .collect();
    if values.is_empty() {
        bail!("wrong iterate syntax: {raw}");
    }
    Ok(IterateSpec {
        component,
        encode,
        values,
    })
}

#[cfg(test)]
mod tests;
