//! Symbol-file access.
//!
//! The link pipeline only needs two answers from a debug-symbol file: which
//! source files it was compiled from (with their checksums), and which of those
//! files no longer match. [`SymbolReader`] is that seam; [`ManifestSymbolOpener`]
//! answers it from a JSON checksum manifest emitted alongside the build.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use pdblink_shared::{PdbLinkError, Result, SourceFileRecord};

/// Read-only view of the source files recorded in one symbol file.
pub trait SymbolReader {
    /// Recorded files in symbol-file order.
    fn files_and_checksums(&self) -> Result<Vec<SourceFileRecord>>;

    /// Build paths of recorded files that are absent on disk or whose content
    /// no longer matches the recorded checksum.
    fn find_missing_or_changed(&self) -> Result<Vec<String>>;
}

/// Opens a [`SymbolReader`] for a symbol file on disk.
pub trait SymbolOpener: Send + Sync {
    fn open(&self, symbol_path: &Path) -> Result<Box<dyn SymbolReader>>;
}

// ---------------------------------------------------------------------------
// Checksum manifest
// ---------------------------------------------------------------------------

/// On-disk manifest shape: `{"files": [{"path": ..., "checksum": "<hex sha256>"}]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChecksumManifest {
    #[serde(default)]
    pub files: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub checksum: String,
}

/// Manifest location for `symbol_path` (`app.pdb` → `app.pdb.checksums.json`).
pub fn manifest_path(symbol_path: &Path) -> PathBuf {
    let mut name = symbol_path.as_os_str().to_os_string();
    name.push(".checksums.json");
    PathBuf::from(name)
}

/// Opens symbol files by reading their checksum manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestSymbolOpener {
    manifest_override: Option<PathBuf>,
}

impl ManifestSymbolOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the manifest from `path` instead of next to the symbol file.
    pub fn with_manifest(path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_override: Some(path.into()),
        }
    }
}

impl SymbolOpener for ManifestSymbolOpener {
    #[instrument(skip_all, fields(symbol = %symbol_path.display()))]
    fn open(&self, symbol_path: &Path) -> Result<Box<dyn SymbolReader>> {
        if !symbol_path.is_file() {
            return Err(PdbLinkError::Symbols(format!(
                "symbol file not found: {}",
                symbol_path.display()
            )));
        }

        let path = self
            .manifest_override
            .clone()
            .unwrap_or_else(|| manifest_path(symbol_path));

        let content = std::fs::read_to_string(&path).map_err(|e| {
            PdbLinkError::Symbols(format!(
                "failed to read checksum manifest {}: {e}",
                path.display()
            ))
        })?;

        let manifest: ChecksumManifest = serde_json::from_str(&content).map_err(|e| {
            PdbLinkError::Symbols(format!("invalid checksum manifest {}: {e}", path.display()))
        })?;

        let records = manifest
            .files
            .into_iter()
            .map(|entry| {
                let checksum = hex::decode(entry.checksum.trim()).map_err(|e| {
                    PdbLinkError::Symbols(format!("bad checksum for {}: {e}", entry.path))
                })?;
                Ok(SourceFileRecord {
                    build_path: entry.path,
                    checksum,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(manifest = %path.display(), files = records.len(), "opened symbol manifest");
        Ok(Box::new(ManifestSymbolReader { records }))
    }
}

struct ManifestSymbolReader {
    records: Vec<SourceFileRecord>,
}

impl SymbolReader for ManifestSymbolReader {
    fn files_and_checksums(&self) -> Result<Vec<SourceFileRecord>> {
        Ok(self.records.clone())
    }

    fn find_missing_or_changed(&self) -> Result<Vec<String>> {
        Ok(self
            .records
            .iter()
            .filter(|record| !matches_on_disk(record))
            .map(|record| record.build_path.clone())
            .collect())
    }
}

/// An unreadable file counts as missing.
fn matches_on_disk(record: &SourceFileRecord) -> bool {
    match std::fs::read(&record.build_path) {
        Ok(bytes) => Sha256::digest(&bytes).as_slice() == record.checksum.as_slice(),
        Err(_) => false,
    }
}
