//! Relative reference resolution.
//!
//! Merges a base URL and a reference into an absolute URL following the
//! reference resolution rules of RFC 3986, with two local choices: the query
//! and fragment always come from the reference, and empty interior path
//! segments are collapsed.

use std::fmt;

/// Schemes whose URLs resolve relative references.
const USES_RELATIVE: &[&str] = &[
    "", "ftp", "http", "https", "gopher", "nntp", "imap", "wais", "file", "telnet", "prospero",
    "shttp", "mms", "rtsp", "rtsps", "rtspu", "sftp", "svn", "svn+ssh", "ws", "wss",
];

/// Whether `scheme` takes part in relative resolution.
pub fn uses_relative(scheme: &str) -> bool {
    USES_RELATIVE
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(scheme))
}

/// `user[:password]@host[:port]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authority {
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: String,
    pub port: Option<u16>,
}

impl Authority {
    fn parse(raw: &str) -> Option<Self> {
        let (userinfo, hostport) = match raw.rsplit_once('@') {
            Some((userinfo, hostport)) => (Some(userinfo), hostport),
            None => (None, raw),
        };

        let (user, password) = match userinfo {
            Some(info) => match info.split_once(':') {
                Some((user, password)) => (Some(user.to_string()), Some(password.to_string())),
                None => (Some(info.to_string()), None),
            },
            None => (None, None),
        };

        let (host, port) = if hostport.starts_with('[') {
            let close = hostport.find(']')?;
            let (host, rest) = hostport.split_at(close + 1);
            match rest.strip_prefix(':') {
                Some(port) => (host, port),
                None if rest.is_empty() => (host, ""),
                None => return None,
            }
        } else {
            match hostport.rsplit_once(':') {
                Some((host, port)) => (host, port),
                None => (hostport, ""),
            }
        };

        let port = if port.is_empty() {
            None
        } else {
            Some(port.parse::<u16>().ok()?)
        };

        Some(Self {
            user,
            password,
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            f.write_str(user)?;
            if let Some(password) = &self.password {
                write!(f, ":{password}")?;
            }
            f.write_str("@")?;
        }
        f.write_str(&self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

/// A URL split into its components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParts {
    /// Scheme as written, empty when absent.
    pub scheme: String,
    /// Present when the URL has a `//` authority section, even if empty.
    pub authority: Option<Authority>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

impl UrlParts {
    /// Split `input` into components.
    ///
    /// Input whose authority cannot be parsed (for instance a non-numeric
    /// port) is treated as a bare relative reference: no scheme, no
    /// authority, everything before `?`/`#` is the path.
    pub fn parse(input: &str) -> Self {
        let (rest, fragment) = match input.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (input, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query.to_string())),
            None => (rest, None),
        };

        let bare = |query: Option<String>, fragment: Option<String>| Self {
            path: rest.to_string(),
            query,
            fragment,
            ..Self::default()
        };

        let (scheme, hier) = match rest.split_once(':') {
            Some((scheme, hier)) if is_scheme(scheme) => (scheme, hier),
            _ => ("", rest),
        };

        let (authority, path) = match hier.strip_prefix("//") {
            Some(after) => {
                let end = after.find('/').unwrap_or(after.len());
                let (raw_authority, path) = after.split_at(end);
                match Authority::parse(raw_authority) {
                    Some(authority) => (Some(authority), path),
                    None => return bare(query, fragment),
                }
            }
            None => (None, hier),
        };

        Self {
            scheme: scheme.to_string(),
            authority,
            path: path.to_string(),
            query,
            fragment,
        }
    }
}

impl fmt::Display for UrlParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }
        if !self.scheme.is_empty() || self.authority.is_some() {
            f.write_str("//")?;
        }
        if let Some(authority) = &self.authority {
            write!(f, "{authority}")?;
        }
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

/// Remove `.` and `..` segments from a path.
///
/// A relative path stays relative. `..` above the first segment is dropped. Empty segments are dropped except a
/// final one, which keeps the trailing slash. A path ending in `.` or `..`
/// also ends with a slash.
pub fn remove_dot_segments(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len().saturating_sub(1);
    let mut output: Vec<&str> = Vec::with_capacity(segments.len());
    let mut trailing_slash = false;
    let skip = usize::from(path.starts_with('/'));

    for (index, segment) in segments.iter().enumerate().skip(skip) {
        let is_last = index == last;
        match *segment {
            "." | "" => trailing_slash = is_last,
            ".." => {
                match output.last() {
                    Some(&"..") => output.push(".."),
                    Some(_) => {
                        output.pop();
                    }
                    None => {}
                }
                trailing_slash = is_last;
            }
            segment => {
                output.push(segment);
                trailing_slash = false;
            }
        }
    }

    let joined = output.join("/");
    let mut resolved = if skip == 1 { format!("/{joined}") } else { joined };
    if trailing_slash && !output.is_empty() {
        resolved.push('/');
    }
    resolved
}

/// Directory part of `path`, up to and including its last `/`. An empty
/// path is the root; a single relative segment has no directory.
fn directory_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..=index],
        None if path.is_empty() => "/",
        None => "",
    }
}

/// Resolve `reference` against `base`.
///
/// An empty reference yields `base`. A reference with its own scheme that
/// differs from the base scheme, or whose effective scheme does not use
/// relative resolution, is returned unchanged. A base with neither scheme
/// nor authority and a relative path (`a/b`) resolves to a relative path
/// (`a/c`).
pub fn resolve(base: &str, reference: &str) -> String {
    if reference.is_empty() {
        return base.to_string();
    }

    let base_parts = UrlParts::parse(base);
    let reference_parts = UrlParts::parse(reference);

    if !reference_parts.scheme.is_empty()
        && !reference_parts.scheme.eq_ignore_ascii_case(&base_parts.scheme)
    {
        return reference.to_string();
    }

    let scheme = base_parts.scheme;
    if !uses_relative(&scheme) {
        return reference.to_string();
    }

    let (authority, path) = if reference_parts.authority.is_some() {
        let path = if reference_parts.path.is_empty() {
            String::new()
        } else {
            remove_dot_segments(&reference_parts.path)
        };
        (reference_parts.authority, path)
    } else if reference_parts.path.is_empty() {
        (base_parts.authority, base_parts.path)
    } else if reference_parts.path.starts_with('/') {
        (
            base_parts.authority,
            remove_dot_segments(&reference_parts.path),
        )
    } else {
        let merged = format!("{}{}", directory_of(&base_parts.path), reference_parts.path);
        (base_parts.authority, remove_dot_segments(&merged))
    };

    UrlParts {
        scheme,
        authority,
        path,
        query: reference_parts.query,
        fragment: reference_parts.fragment,
    }
    .to_string()
}

/// Resolves references against a fixed base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResolver {
    base: String,
}

impl UrlResolver {
    /// Create a resolver for `base`.
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// The base URL.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Resolve `reference` against the base.
    pub fn resolve(&self, reference: &str) -> String {
        resolve(&self.base, reference)
    }
}
