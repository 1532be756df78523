//! URL component access over the `url` crate.
//!
//! The rest of the tool never touches URL grammar directly; everything
//! goes through `UrlHandle`, which exposes the fixed component set with
//! absent-vs-failure error kinds and owns scheme guessing, the space
//! policy, and punycode/IDN host conversion.

use std::fmt;

use crate::codec;

/// One named part of a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlComponent {
    Scheme,
    User,
    Password,
    Options,
    Host,
    Port,
    Path,
    Query,
    Fragment,
    ZoneId,
    /// The whole recomposed URL.
    Url,
}

impl UrlComponent {
    /// Every proper component in output order (excluding the `url`
    /// pseudo-component).
    pub const ALL: [UrlComponent; 10] = [
        UrlComponent::Scheme,
        UrlComponent::User,
        UrlComponent::Password,
        UrlComponent::Options,
        UrlComponent::Host,
        UrlComponent::Port,
        UrlComponent::Path,
        UrlComponent::Query,
        UrlComponent::Fragment,
        UrlComponent::ZoneId,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scheme" => Some(UrlComponent::Scheme),
            "user" => Some(UrlComponent::User),
            "password" => Some(UrlComponent::Password),
            "options" => Some(UrlComponent::Options),
            "host" => Some(UrlComponent::Host),
            "port" => Some(UrlComponent::Port),
            "path" => Some(UrlComponent::Path),
            "query" => Some(UrlComponent::Query),
            "fragment" => Some(UrlComponent::Fragment),
            "zoneid" => Some(UrlComponent::ZoneId),
            "url" => Some(UrlComponent::Url),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UrlComponent::Scheme => "scheme",
            UrlComponent::User => "user",
            UrlComponent::Password => "password",
            UrlComponent::Options => "options",
            UrlComponent::Host => "host",
            UrlComponent::Port => "port",
            UrlComponent::Path => "path",
            UrlComponent::Query => "query",
            UrlComponent::Fragment => "fragment",
            UrlComponent::ZoneId => "zoneid",
            UrlComponent::Url => "url",
        }
    }
}

/// Why `get` produced no value. Absence is the expected case and handled
/// quietly; anything else is a real failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetError {
    /// The component is legitimately absent from this URL.
    Absent(UrlComponent),
    /// The host could not be converted to its unicode form.
    IdnConversion(String),
}

impl fmt::Display for GetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GetError::Absent(c) => write!(f, "no {} in this URL", c.name()),
            GetError::IdnConversion(host) => {
                write!(f, "error converting '{host}' to IDN")
            }
        }
    }
}

impl std::error::Error for GetError {}

/// Why `set` failed. Set failures are per-URL warnings, never fatal.
#[derive(Debug, Clone)]
pub enum SetError {
    /// The component cannot be represented through the `url` crate.
    Unsupported(UrlComponent),
    Invalid {
        component: UrlComponent,
        reason: String,
    },
}

impl fmt::Display for SetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetError::Unsupported(c) => {
                write!(f, "{} cannot be set through the URL accessor", c.name())
            }
            SetError::Invalid { component, reason } => {
                write!(f, "invalid {}: {}", component.name(), reason)
            }
        }
    }
}

impl std::error::Error for SetError {}

/// Parse failure for a candidate URL.
#[derive(Debug, Clone)]
pub enum ParseUrlError {
    MissingScheme(String),
    Space(String),
    Invalid {
        url: String,
        reason: url::ParseError,
    },
}

impl fmt::Display for ParseUrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseUrlError::MissingScheme(url) => {
                write!(f, "no scheme in '{url}' and guessing is disabled")
            }
            ParseUrlError::Space(url) => {
                write!(f, "whitespace in '{url}' (use --accept-space to allow it)")
            }
            ParseUrlError::Invalid { url, reason } => write!(f, "{reason} [{url}]"),
        }
    }
}

impl std::error::Error for ParseUrlError {}

/// How candidate URLs are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Reject URLs with no scheme instead of guessing one.
    pub no_guess_scheme: bool,
    /// Percent-encode literal whitespace instead of rejecting the URL.
    pub accept_space: bool,
}

/// Per-get output flags: the global CLI switches merged with any
/// per-reference modifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetFlags {
    /// Return the component percent-encoded instead of decoded.
    pub urlencoded: bool,
    /// Fall back to the scheme's known default port when none is set.
    pub default_port: bool,
    /// Host in punycode (the stored form).
    pub punycode: bool,
    /// Host converted to unicode.
    pub as_idn: bool,
}

/// A parsed URL with component-wise access.
#[derive(Debug, Clone)]
pub struct UrlHandle {
    url: url::Url,
}

impl UrlHandle {
    /// Parses a candidate URL. A missing scheme is guessed from the host
    /// (an `ftp.` prefix guesses `ftp://`, anything else `http://`)
    /// unless guessing is disabled.
    pub fn parse(raw: &str, opts: &ParseOptions) -> Result<Self, ParseUrlError> {
        let mut candidate = raw.to_string();
        if candidate.contains(' ') || candidate.contains('\t') {
            if !opts.accept_space {
                return Err(ParseUrlError::Space(raw.to_string()));
            }
            candidate = candidate.replace(' ', "%20").replace('\t', "%09");
        }
        match url::Url::parse(&candidate) {
            Ok(url) => {
                // "host:port" satisfies the scheme grammar; re-parse with a
                // guessed scheme when nothing that looks like one is present
                if url.host_str().is_none() && !candidate.contains("://") && !opts.no_guess_scheme {
                    if let Ok(guessed) = url::Url::parse(&format!("http://{candidate}")) {
                        return Ok(Self { url: guessed });
                    }
                }
                Ok(Self { url })
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                if opts.no_guess_scheme {
                    return Err(ParseUrlError::MissingScheme(raw.to_string()));
                }
                let scheme = if candidate.starts_with("ftp.") { "ftp" } else { "http" };
                let guessed = format!("{scheme}://{candidate}");
                url::Url::parse(&guessed)
                    .map(|url| Self { url })
                    .map_err(|reason| ParseUrlError::Invalid {
                        url: raw.to_string(),
                        reason,
                    })
            }
            Err(reason) => Err(ParseUrlError::Invalid {
                url: raw.to_string(),
                reason,
            }),
        }
    }

    /// Resolves `target` as a reference against this URL.
    pub fn redirect(&mut self, target: &str) -> Result<(), ParseUrlError> {
        self.url = self.url.join(target).map_err(|reason| ParseUrlError::Invalid {
            url: target.to_string(),
            reason,
        })?;
        Ok(())
    }

    /// Fetches one component. Values come back as bytes because decoded
    /// components may contain arbitrary octets.
    pub fn get(&self, component: UrlComponent, flags: &GetFlags) -> Result<Vec<u8>, GetError> {
        match component {
            UrlComponent::Url => Ok(self.url.as_str().as_bytes().to_vec()),
            UrlComponent::Scheme => Ok(self.url.scheme().as_bytes().to_vec()),
            UrlComponent::User => {
                let user = self.url.username();
                if user.is_empty() {
                    return Err(GetError::Absent(component));
                }
                Ok(maybe_decode(user, flags))
            }
            UrlComponent::Password => match self.url.password() {
                Some(p) => Ok(maybe_decode(p, flags)),
                None => Err(GetError::Absent(component)),
            },
            UrlComponent::Host => {
                let host = match self.url.host_str() {
                    Some(h) => h,
                    None => return Err(GetError::Absent(component)),
                };
                if flags.punycode {
                    // the stored form is already punycode
                    return Ok(host.as_bytes().to_vec());
                }
                if flags.as_idn {
                    let (unicode, result) = idna::domain_to_unicode(host);
                    if result.is_err() {
                        return Err(GetError::IdnConversion(host.to_string()));
                    }
                    return Ok(unicode.into_bytes());
                }
                Ok(host.as_bytes().to_vec())
            }
            UrlComponent::Port => {
                let port = if flags.default_port {
                    self.url.port_or_known_default()
                } else {
                    self.url.port()
                };
                match port {
                    Some(p) => Ok(p.to_string().into_bytes()),
                    None => Err(GetError::Absent(component)),
                }
            }
            UrlComponent::Path => {
                let path = self.url.path();
                if flags.urlencoded {
                    Ok(path.as_bytes().to_vec())
                } else {
                    Ok(codec::decode_path(path).unwrap_or_else(|_| path.as_bytes().to_vec()))
                }
            }
            UrlComponent::Query => match self.url.query() {
                Some(q) if flags.urlencoded => Ok(q.as_bytes().to_vec()),
                Some(q) => {
                    Ok(codec::decode_query(q.as_bytes()).unwrap_or_else(|_| q.as_bytes().to_vec()))
                }
                None => Err(GetError::Absent(component)),
            },
            UrlComponent::Fragment => match self.url.fragment() {
                Some(frag) => Ok(maybe_decode(frag, flags)),
                None => Err(GetError::Absent(component)),
            },
            // not representable by the url crate
            UrlComponent::Options | UrlComponent::ZoneId => Err(GetError::Absent(component)),
        }
    }

    /// Sets a component. An empty value clears it where the accessor
    /// allows clearing; `encode` pre-encodes the value.
    pub fn set(&mut self, component: UrlComponent, value: &str, encode: bool) -> Result<(), SetError> {
        let invalid = |reason: String| SetError::Invalid { component, reason };
        let clear = value.is_empty();
        match component {
            UrlComponent::Scheme => {
                if clear {
                    return Err(invalid("scheme cannot be cleared".into()));
                }
                if self.url.set_scheme(value).is_ok() {
                    return Ok(());
                }
                // the url crate refuses some special/non-special moves;
                // rebuild textually and reparse instead
                let rest = match self.url.as_str().split_once(':') {
                    Some((_, rest)) => rest.to_string(),
                    None => return Err(invalid("URL has no scheme separator".into())),
                };
                match url::Url::parse(&format!("{value}:{rest}")) {
                    Ok(url) => {
                        self.url = url;
                        Ok(())
                    }
                    Err(e) => Err(invalid(e.to_string())),
                }
            }
            UrlComponent::User => {
                let v = encoded_value(value, encode);
                self.url
                    .set_username(&v)
                    .map_err(|()| invalid("cannot set user on this URL".into()))
            }
            UrlComponent::Password => {
                if clear {
                    return self
                        .url
                        .set_password(None)
                        .map_err(|()| invalid("cannot clear password on this URL".into()));
                }
                let v = encoded_value(value, encode);
                self.url
                    .set_password(Some(&v))
                    .map_err(|()| invalid("cannot set password on this URL".into()))
            }
            UrlComponent::Host => {
                if clear {
                    return self.url.set_host(None).map_err(|e| invalid(e.to_string()));
                }
                self.url
                    .set_host(Some(value))
                    .map_err(|e| invalid(e.to_string()))
            }
            UrlComponent::Port => {
                if clear {
                    return self
                        .url
                        .set_port(None)
                        .map_err(|()| invalid("cannot clear port on this URL".into()));
                }
                let port: u16 = value
                    .parse()
                    .map_err(|_| invalid(format!("'{value}' is not a port number")))?;
                self.url
                    .set_port(Some(port))
                    .map_err(|()| invalid("cannot set port on this URL".into()))
            }
            UrlComponent::Path => {
                let v = if encode {
                    codec::encode_path(value.as_bytes())
                } else {
                    value.to_string()
                };
                self.url.set_path(&v);
                Ok(())
            }
            UrlComponent::Query => {
                if clear {
                    self.url.set_query(None);
                    return Ok(());
                }
                let v = if encode {
                    codec::encode_query_structure(value.as_bytes())
                } else {
                    value.to_string()
                };
                self.url.set_query(Some(&v));
                Ok(())
            }
            UrlComponent::Fragment => {
                if clear {
                    self.url.set_fragment(None);
                    return Ok(());
                }
                let v = encoded_value(value, encode);
                self.url.set_fragment(Some(&v));
                Ok(())
            }
            UrlComponent::Url => {
                self.url = url::Url::parse(value).map_err(|e| invalid(e.to_string()))?;
                Ok(())
            }
            UrlComponent::Options | UrlComponent::ZoneId => Err(SetError::Unsupported(component)),
        }
    }

    /// Raw (encoded) query as stored.
    pub fn raw_query(&self) -> Option<&str> {
        self.url.query()
    }

    pub fn set_raw_query(&mut self, query: Option<&str>) {
        self.url.set_query(query);
    }

    /// Current path in encoded form.
    pub fn raw_path(&self) -> &str {
        self.url.path()
    }

    pub fn set_raw_path(&mut self, path: &str) {
        self.url.set_path(path);
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

fn maybe_decode(raw: &str, flags: &GetFlags) -> Vec<u8> {
    if flags.urlencoded {
        raw.as_bytes().to_vec()
    } else {
        codec::decode_plain(raw.as_bytes()).unwrap_or_else(|_| raw.as_bytes().to_vec())
    }
}

fn encoded_value(value: &str, encode: bool) -> String {
    if encode {
        codec::encode_component(value.as_bytes())
    } else {
        value.to_string()
    }
}
