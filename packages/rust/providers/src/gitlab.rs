//! GitLab.com hosting provider.

use super::{HostingProvider, ProviderMatch};
use crate::remote::RemoteUrl;

/// Matches `gitlab.com` remotes, including nested group paths.
///
/// GitLab puts the revision in the middle of the raw URL (`/-/raw/<rev>/<file>`),
/// so this provider emits a full placeholder template rather than a prefix.
pub struct GitLabProvider;

impl HostingProvider for GitLabProvider {
    fn matches(&self, url: &str) -> Option<ProviderMatch> {
        let remote = RemoteUrl::parse(url)?;
        if remote.host != "gitlab.com" || remote.segments.len() < 2 {
            return None;
        }

        let project_path = remote.segments.join("/");
        Some(ProviderMatch::flat(
            self.name(),
            url,
            format!("https://gitlab.com/{project_path}/-/raw/{{revision}}/{{filename}}"),
        ))
    }

    fn name(&self) -> &str {
        "gitlab"
    }
}
