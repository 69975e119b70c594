//! Build path → repository path resolution.
//!
//! Symbol files record whatever spelling the compiler saw: backslashes,
//! lower-cased drive letters, differing case on case-insensitive file
//! systems. Both normalizers compare the root prefix case-insensitively and
//! return the repository's own spelling of the remainder, `/`-separated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Maps one build path to a tracked repository path.
pub trait PathNormalizer {
    /// `None` when the path is outside the root or not tracked.
    fn normalize(&self, build_path: &str) -> Option<String>;
}

/// Segments of `path` below `root`, or `None` when `path` is not under `root`.
///
/// Either separator is accepted in both arguments. `.` segments are dropped
/// and `..` pops the previous segment.
pub fn relative_segments(root: &str, path: &str) -> Option<Vec<String>> {
    let root = segments(root);
    let path = segments(path);

    if path.len() <= root.len() {
        return None;
    }

    let under_root = root
        .iter()
        .zip(&path)
        .all(|(r, p)| r.to_lowercase() == p.to_lowercase());

    under_root.then(|| path[root.len()..].to_vec())
}

fn segments(path: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other.to_string()),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Index-backed
// ---------------------------------------------------------------------------

/// Resolves against the repository's list of tracked files.
#[derive(Debug, Clone)]
pub struct IndexNormalizer {
    root: String,
    /// Lower-cased relative path → tracked spelling.
    tracked: HashMap<String, String>,
}

impl IndexNormalizer {
    pub fn new(workdir: &Path, tracked_files: impl IntoIterator<Item = String>) -> Self {
        let mut tracked = HashMap::new();
        for path in tracked_files {
            tracked.entry(path.to_lowercase()).or_insert(path);
        }

        Self {
            root: workdir.to_string_lossy().into_owned(),
            tracked,
        }
    }
}

impl PathNormalizer for IndexNormalizer {
    fn normalize(&self, build_path: &str) -> Option<String> {
        let relative = relative_segments(&self.root, build_path)?;
        self.tracked.get(&relative.join("/").to_lowercase()).cloned()
    }
}

// ---------------------------------------------------------------------------
// File-system-backed
// ---------------------------------------------------------------------------

/// Resolves by walking the directory tree under `root`.
///
/// Used when no repository handle is available; "tracked" then means
/// "present on disk".
#[derive(Debug, Clone)]
pub struct FsNormalizer {
    root: PathBuf,
}

impl FsNormalizer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PathNormalizer for FsNormalizer {
    fn normalize(&self, build_path: &str) -> Option<String> {
        let relative = relative_segments(&self.root.to_string_lossy(), build_path)?;

        let mut current = self.root.clone();
        let mut canonical = Vec::with_capacity(relative.len());
        for segment in &relative {
            let name = find_entry(&current, segment)?;
            current.push(&name);
            canonical.push(name);
        }

        current.is_file().then(|| canonical.join("/"))
    }
}

/// Directory entry of `dir` matching `segment`, exact spelling preferred.
fn find_entry(dir: &Path, segment: &str) -> Option<String> {
    let names = entry_names(dir)?;
    if names.iter().any(|n| n == segment) {
        return Some(segment.to_string());
    }

    let wanted = segment.to_lowercase();
    names.into_iter().find(|n| n.to_lowercase() == wanted)
}

fn entry_names(dir: &Path) -> Option<Vec<String>> {
    let entries = std::fs::read_dir(dir).ok()?;
    Some(
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
    )
}
