//! M3U8 rewriting
//!
//! Every URI line of a playlist is pointed back at the relay so segment and
//! variant requests also flow through it. Tag lines (`#...`), blank lines
//! and lines that already hold an absolute URL are emitted untouched, and
//! each line keeps its original terminator.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Characters left bare when a URL travels as a query value. Matches the
/// unreserved set browsers keep in `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// What a single playlist line holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    /// `#EXTM3U`, `#EXTINF:...`, or a plain comment
    Directive,
    Absolute,
    /// A URI to resolve against the playlist URL, trimmed of surrounding whitespace
    Relative(&'a str),
}

/// Classify one line (without its terminator)
#[must_use]
pub fn classify_line(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineKind::Blank
    } else if trimmed.starts_with('#') {
        LineKind::Directive
    } else if is_absolute_url(trimmed) {
        LineKind::Absolute
    } else {
        LineKind::Relative(trimmed)
    }
}

fn is_absolute_url(raw: &str) -> bool {
    let has_prefix = |prefix: &str| {
        raw.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    has_prefix("http://") || has_prefix("https://")
}

/// Rewrites playlists fetched from `base` into relay URLs under `proxy_path`
#[derive(Debug, Clone)]
pub struct ManifestRewriter<'a> {
    base: &'a Url,
    proxy_path: &'a str,
}

impl<'a> ManifestRewriter<'a> {
    #[must_use]
    pub const fn new(base: &'a Url, proxy_path: &'a str) -> Self {
        Self { base, proxy_path }
    }

    /// Rewrite a whole playlist body
    #[must_use]
    pub fn rewrite(&self, playlist: &str) -> String {
        let mut output = String::with_capacity(playlist.len() + playlist.len() / 2);

        for raw in playlist.split_inclusive('\n') {
            let (line, terminator) = split_terminator(raw);
            match classify_line(line) {
                LineKind::Relative(target) => {
                    output.push_str(&proxy_url(self.proxy_path, &self.resolve(target)));
                }
                LineKind::Blank | LineKind::Directive | LineKind::Absolute => output.push_str(line),
            }
            output.push_str(terminator);
        }

        output
    }

    /// Absolute URL of a relative playlist entry
    #[must_use]
    pub fn resolve(&self, target: &str) -> String {
        self.base.join(target).map_or_else(
            |_| format!("{}{target}", directory_of(self.base.as_str())),
            String::from,
        )
    }
}

/// Convenience wrapper around [`ManifestRewriter`]
#[must_use]
pub fn rewrite_manifest(playlist: &str, base: &Url, proxy_path: &str) -> String {
    ManifestRewriter::new(base, proxy_path).rewrite(playlist)
}

/// `<proxy_path>?url=<percent-encoded absolute URL>`
#[must_use]
pub fn proxy_url(proxy_path: &str, absolute: &str) -> String {
    format!("{proxy_path}?url={}", utf8_percent_encode(absolute, URI_COMPONENT))
}

/// Everything up to and including the last `/`
fn directory_of(url: &str) -> &str {
    url.rfind('/').map_or(url, |idx| &url[..=idx])
}

fn split_terminator(raw: &str) -> (&str, &str) {
    if let Some(line) = raw.strip_suffix("\r\n") {
        (line, "\r\n")
    } else if let Some(line) = raw.strip_suffix('\n') {
        (line, "\n")
    } else {
        (raw, "")
    }
}
