//! Index builder: turns a provider match and resolved paths into a [`LinkContext`].

use tracing::{debug, instrument};

use pdblink_providers::{FILENAME_PLACEHOLDER, ProviderMatch, REVISION_PLACEHOLDER};
use pdblink_shared::{DownloadMethod, PathPair, PdbLinkError, Result};

/// Internal token for the revision inside a normalized URL template.
pub const REVISION_TOKEN: &str = "{0}";

/// srcsrv per-entry variable holding the repository-relative path.
pub const FILENAME_TOKEN: &str = "%var2%";

/// Everything the serializer needs for one symbol file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkContext {
    /// Commit identifier; never empty.
    pub revision: String,
    /// Normalized template containing one [`REVISION_TOKEN`] and one [`FILENAME_TOKEN`].
    pub raw_url_template: String,
    pub download_method: DownloadMethod,
    /// In symbol-file enumeration order, including unresolved entries.
    pub path_pairs: Vec<PathPair>,
    /// Ordered key/value pairs for providers that resolve content server-side.
    pub extra_metadata: Vec<(String, String)>,
}

impl LinkContext {
    /// The raw URL with the revision filled in and the per-file token left in place.
    pub fn raw_url(&self) -> String {
        self.raw_url_template.replace(REVISION_TOKEN, &self.revision)
    }

    /// Pairs that made it into the index.
    pub fn indexed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.path_pairs
            .iter()
            .filter_map(|p| p.repo_path.as_deref().map(|r| (p.build_path.as_str(), r)))
    }

    pub fn indexed_count(&self) -> usize {
        self.indexed().count()
    }

    pub fn total_count(&self) -> usize {
        self.path_pairs.len()
    }
}

/// Normalize a provider's raw-content URL into the serializer's token form.
///
/// - each placeholder exactly once: substituted in place
/// - neither: treated as a directory prefix, `<raw>/<rev>/<file>`
/// - anything else (one missing, or either repeated): rejected as ambiguous
pub fn normalize_template(raw_url: &str) -> Result<String> {
    let revisions = raw_url.matches(REVISION_PLACEHOLDER).count();
    let filenames = raw_url.matches(FILENAME_PLACEHOLDER).count();

    match (revisions, filenames) {
        (1, 1) => Ok(raw_url
            .replace(REVISION_PLACEHOLDER, REVISION_TOKEN)
            .replace(FILENAME_PLACEHOLDER, FILENAME_TOKEN)),
        (0, 0) => Ok(format!(
            "{}/{REVISION_TOKEN}/{FILENAME_TOKEN}",
            raw_url.trim_end_matches('/')
        )),
        _ => Err(PdbLinkError::config(format!(
            "raw URL '{raw_url}' must contain {REVISION_PLACEHOLDER} and \
             {FILENAME_PLACEHOLDER} exactly once each, or neither"
        ))),
    }
}

/// Assemble the link context for one symbol file.
#[instrument(skip_all, fields(provider = %provider.provider, files = path_pairs.len()))]
pub fn build(
    provider: &ProviderMatch,
    revision: &str,
    path_pairs: Vec<PathPair>,
    download_method: DownloadMethod,
) -> Result<LinkContext> {
    let revision = revision.trim();
    if revision.is_empty() {
        return Err(PdbLinkError::validation("revision must not be empty"));
    }

    let raw_url_template = normalize_template(&provider.raw_url)?;

    let mut extra_metadata = Vec::new();
    if let Some(meta) = &provider.structured {
        extra_metadata.push(("TFS_COLLECTION".to_string(), meta.collection_url.clone()));
        extra_metadata.push(("TFS_TEAM_PROJECT".to_string(), meta.project.clone()));
        extra_metadata.push(("TFS_REPO".to_string(), meta.project.clone()));
        extra_metadata.push(("TFS_COMMIT".to_string(), revision.to_string()));
    }

    debug!(template = %raw_url_template, structured = !extra_metadata.is_empty(), "index context built");

    Ok(LinkContext {
        revision: revision.to_string(),
        raw_url_template,
        download_method,
        path_pairs,
        extra_metadata,
    })
}
