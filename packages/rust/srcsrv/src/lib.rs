//! Source-server index construction and serialization.
//!
//! This crate provides:
//! - [`context`]: builds a [`LinkContext`] from a provider match and resolved paths
//! - [`writer`]: renders a context into the `srcsrv` text stream
//! - side-car file helpers used before the stream is embedded

pub mod context;
pub mod writer;

use std::path::{Path, PathBuf};

use tracing::debug;

use pdblink_shared::{PdbLinkError, Result};

pub use context::{FILENAME_TOKEN, LinkContext, REVISION_TOKEN, build, normalize_template};
pub use writer::{LINE_END, serialize};

/// Path of the side-car index written next to `symbol_path` (`app.pdb` → `app.pdb.srcsrv`).
pub fn sidecar_path(symbol_path: &Path) -> PathBuf {
    let mut name = symbol_path.as_os_str().to_os_string();
    name.push(".srcsrv");
    PathBuf::from(name)
}

/// Serialize `context` and write it next to `symbol_path`.
///
/// The file is written to a temp name first and renamed into place.
pub fn write_sidecar(symbol_path: &Path, context: &LinkContext) -> Result<PathBuf> {
    let target = sidecar_path(symbol_path);
    let mut temp_name = target.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp = PathBuf::from(temp_name);

    let bytes = serialize(context);
    std::fs::write(&temp, &bytes).map_err(|e| PdbLinkError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| PdbLinkError::io(&target, e))?;

    debug!(path = %target.display(), size = bytes.len(), "wrote srcsrv index");
    Ok(target)
}
