//! Embedding the side-car index into the symbol file.

use std::path::Path;
use std::process::Command;

use tracing::{debug, instrument};

use pdblink_shared::{PdbLinkError, Result};

/// Writes an index file into a symbol file's `srcsrv` stream.
pub trait Embedder: Send + Sync {
    fn embed(&self, symbol_path: &Path, index_path: &Path) -> Result<()>;
}

/// Runs the Debugging Tools `pdbstr` utility.
#[derive(Debug, Clone)]
pub struct PdbstrEmbedder {
    program: String,
}

impl PdbstrEmbedder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Embedder for PdbstrEmbedder {
    #[instrument(skip_all, fields(program = %self.program, symbol = %symbol_path.display()))]
    fn embed(&self, symbol_path: &Path, index_path: &Path) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("-w")
            .arg(format!("-p:{}", symbol_path.display()))
            .arg("-s:srcsrv")
            .arg(format!("-i:{}", index_path.display()))
            .output()
            .map_err(|e| {
                PdbLinkError::Embed(format!(
                    "failed to run {}: {e}. Is it installed?",
                    self.program
                ))
            })?;

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map_or_else(|| "a signal".to_string(), |c| c.to_string());
            return Err(PdbLinkError::Embed(format!(
                "{} exited with {status}\n{}{}",
                self.program,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        debug!("embedded srcsrv stream");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_is_an_embed_error() {
        let embedder = PdbstrEmbedder::new("pdblink-no-such-pdbstr");
        let err = embedder
            .embed(Path::new("app.pdb"), Path::new("app.pdb.srcsrv"))
            .unwrap_err();
        assert!(matches!(err, PdbLinkError::Embed(_)));
        assert!(err.to_string().contains("pdblink-no-such-pdbstr"));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_an_embed_error() {
        let embedder = PdbstrEmbedder::new("false");
        let err = embedder
            .embed(Path::new("app.pdb"), Path::new("app.pdb.srcsrv"))
            .unwrap_err();
        assert!(matches!(err, PdbLinkError::Embed(_)));
        assert!(err.to_string().contains("false exited with 1"));
    }

    #[cfg(unix)]
    #[test]
    fn zero_exit_is_success() {
        let embedder = PdbstrEmbedder::new("true");
        embedder
            .embed(Path::new("app.pdb"), Path::new("app.pdb.srcsrv"))
            .unwrap();
    }
}
