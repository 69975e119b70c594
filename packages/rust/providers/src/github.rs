//! GitHub hosting provider.

use super::{HostingProvider, ProviderMatch};
use crate::remote::RemoteUrl;

/// Matches `github.com` remotes and serves raw content from `raw.githubusercontent.com`.
pub struct GitHubProvider;

impl HostingProvider for GitHubProvider {
    fn matches(&self, url: &str) -> Option<ProviderMatch> {
        let remote = RemoteUrl::parse(url)?;
        if remote.host != "github.com" && remote.host != "www.github.com" {
            return None;
        }

        match remote.parts().as_slice() {
            [owner, repo] => Some(ProviderMatch::flat(
                self.name(),
                url,
                format!("https://raw.githubusercontent.com/{owner}/{repo}"),
            )),
            _ => None,
        }
    }

    fn name(&self) -> &str {
        "github"
    }
}
