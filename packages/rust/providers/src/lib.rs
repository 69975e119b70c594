//! Hosting-provider detection for git remotes.
//!
//! This crate provides:
//! - [`HostingProvider`]: one implementation per hosting service
//! - [`ProviderRegistry`]: picks the first provider matching a candidate remote URL
//! - [`RemoteUrl`]: scheme and scp-like remote parsing

mod azure;
mod bitbucket;
mod custom;
mod github;
mod gitlab;
pub mod remote;

use pdblink_shared::{CustomProviderConfig, Result};
use tracing::debug;

pub use azure::AzureDevOpsProvider;
pub use bitbucket::BitbucketProvider;
pub use custom::CustomProvider;
pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;
pub use remote::RemoteUrl;

/// Placeholder for the commit identifier in raw-content URL templates.
pub const REVISION_PLACEHOLDER: &str = "{revision}";

/// Placeholder for the repository-relative file path in raw-content URL templates.
pub const FILENAME_PLACEHOLDER: &str = "{filename}";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Identifiers for providers that resolve content server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredMetadata {
    /// Collection (organization) URL, with a trailing `/`.
    pub collection_url: String,
    /// Project name; also used as the repository id.
    pub project: String,
}

/// A provider's answer for one remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMatch {
    /// Name of the provider that matched.
    pub provider: String,
    /// The remote URL that matched.
    pub remote_url: String,
    /// Raw-content URL: either a directory prefix or a template with
    /// [`REVISION_PLACEHOLDER`] and [`FILENAME_PLACEHOLDER`].
    pub raw_url: String,
    /// Present only for providers that need structured metadata.
    pub structured: Option<StructuredMetadata>,
}

impl ProviderMatch {
    /// A match for a provider served from a client-built URL.
    pub fn flat(provider: &str, remote_url: &str, raw_url: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            remote_url: remote_url.to_string(),
            raw_url: raw_url.into(),
            structured: None,
        }
    }
}

/// A remote hosting service with its own raw-content URL convention.
pub trait HostingProvider: Send + Sync {
    /// Try to recognize `url` as a remote of this service.
    fn matches(&self, url: &str) -> Option<ProviderMatch>;

    /// Human-readable provider name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered providers in priority order.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn HostingProvider>>,
}

impl ProviderRegistry {
    /// Create a registry with all built-in providers.
    pub fn new() -> Self {
        Self {
            providers: vec![
                Box::new(GitHubProvider),
                Box::new(BitbucketProvider),
                Box::new(GitLabProvider),
                Box::new(AzureDevOpsProvider),
            ],
        }
    }

    /// Built-in providers, preceded by the configured custom ones.
    pub fn with_custom(configs: &[CustomProviderConfig]) -> Result<Self> {
        let mut registry = Self::new();
        for config in configs.iter().rev() {
            registry.register_first(Box::new(CustomProvider::from_config(config)?));
        }
        Ok(registry)
    }

    /// Insert a provider ahead of every existing one.
    pub fn register_first(&mut self, provider: Box<dyn HostingProvider>) {
        self.providers.insert(0, provider);
    }

    /// Provider names in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Detect the provider for a single URL.
    pub fn detect(&self, url: &str) -> Option<ProviderMatch> {
        self.providers.iter().find_map(|p| p.matches(url))
    }

    /// Return the first match over `candidates`, in the caller's order.
    ///
    /// `None` when there are no candidates or none of them is recognized.
    pub fn select<S: AsRef<str>>(&self, candidates: &[S]) -> Option<ProviderMatch> {
        for candidate in candidates {
            let url = candidate.as_ref();
            match self.detect(url) {
                Some(found) => {
                    debug!(url, provider = %found.provider, "provider matched");
                    return Some(found);
                }
                None => debug!(url, "no provider matched"),
            }
        }
        None
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
