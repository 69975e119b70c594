//! Remote URL parsing shared by the built-in providers.
//!
//! Git remotes come in two shapes: scheme URLs (`https://`, `ssh://`, `git://`)
//! and scp-like shorthand (`git@github.com:owner/repo.git`). Both are reduced
//! to a host plus path segments.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// `[user@]host:path`, where `path` does not start with `//`.
static SCP_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<user>[^@/]+)@)?(?P<host>[A-Za-z0-9.\-]+):(?P<path>[^/].*)$")
        .expect("scp-like remote regex is valid")
});

/// A remote URL broken into the parts providers match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    /// Lowercased host name.
    pub host: String,
    /// Non-empty path segments, with a trailing `.git` removed from the last one.
    pub segments: Vec<String>,
}

impl RemoteUrl {
    /// Parse a remote URL. Returns `None` for anything that is not a network remote
    /// (local paths, `file://` URLs, garbage).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(url) = Url::parse(raw) {
            if !matches!(url.scheme(), "http" | "https" | "ssh" | "git") {
                return None;
            }
            let host = url.host_str()?.to_ascii_lowercase();
            return Some(Self::from_parts(host, url.path()));
        }

        let caps = SCP_LIKE.captures(raw)?;
        let host = caps.name("host")?.as_str().to_ascii_lowercase();
        Some(Self::from_parts(host, caps.name("path")?.as_str()))
    }

    fn from_parts(host: String, path: &str) -> Self {
        let mut segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        if let Some(last) = segments.last_mut() {
            if let Some(stripped) = last.strip_suffix(".git") {
                *last = stripped.to_string();
            }
        }
        segments.retain(|s| !s.is_empty());

        Self { host, segments }
    }

    /// The segments as string slices, for slice-pattern matching.
    pub fn parts(&self) -> Vec<&str> {
        self.segments.iter().map(String::as_str).collect()
    }
}
