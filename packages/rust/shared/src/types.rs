//! Core domain types shared by the provider, index, and link crates.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SourceFileRecord
// ---------------------------------------------------------------------------

/// One source file compiled into the binary, as recorded in the debug-symbol file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFileRecord {
    /// Absolute path as recorded at compile time.
    pub build_path: String,
    /// Opaque checksum bytes; compared, never interpreted.
    pub checksum: Vec<u8>,
}

// ---------------------------------------------------------------------------
// PathPair
// ---------------------------------------------------------------------------

/// A build-time path and the repository-relative path it resolved to, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPair {
    pub build_path: String,
    /// `None` when the file is not tracked; excluded from the emitted index.
    pub repo_path: Option<String>,
}

impl PathPair {
    pub fn new(build_path: impl Into<String>, repo_path: Option<String>) -> Self {
        Self {
            build_path: build_path.into(),
            repo_path,
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.repo_path.is_some()
    }
}

// ---------------------------------------------------------------------------
// DownloadMethod
// ---------------------------------------------------------------------------

/// How the debugger retrieves each source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMethod {
    /// The debugger fetches the raw URL itself.
    #[default]
    Http,
    /// A PowerShell command downloads the file into the debugger's cache.
    Powershell,
}

impl DownloadMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Powershell => "powershell",
        }
    }
}

impl std::fmt::Display for DownloadMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DownloadMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "powershell" => Ok(Self::Powershell),
            other => Err(format!(
                "unknown download method '{other}': expected 'http' or 'powershell'"
            )),
        }
    }
}
