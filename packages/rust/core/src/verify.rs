//! Checksum verification pass.
//!
//! Never fails the link: mismatches and reader errors become warnings.

use pdblink_shared::Reporter;

use crate::symbols::SymbolReader;

/// Warn about every recorded file that is missing or changed on disk.
///
/// Returns the offending build paths; an empty list when the reader itself fails.
pub fn find_changed_or_missing(reader: &dyn SymbolReader, reporter: &dyn Reporter) -> Vec<String> {
    match reader.find_missing_or_changed() {
        Ok(paths) => {
            for path in &paths {
                reporter.warning(&format!("{path} is missing or has changed since the build"));
            }
            if paths.is_empty() {
                reporter.debug("all recorded source files match their checksums");
            }
            paths
        }
        Err(e) => {
            reporter.warning(&format!("could not verify source checksums: {e}"));
            Vec::new()
        }
    }
}
