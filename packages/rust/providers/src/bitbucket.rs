//! Bitbucket Cloud hosting provider.

use super::{HostingProvider, ProviderMatch};
use crate::remote::RemoteUrl;

/// Matches `bitbucket.org` remotes; raw content lives under `/<owner>/<repo>/raw`.
pub struct BitbucketProvider;

impl HostingProvider for BitbucketProvider {
    fn matches(&self, url: &str) -> Option<ProviderMatch> {
        let remote = RemoteUrl::parse(url)?;
        if remote.host != "bitbucket.org" {
            return None;
        }

        match remote.parts().as_slice() {
            [owner, repo] => Some(ProviderMatch::flat(
                self.name(),
                url,
                format!("https://bitbucket.org/{owner}/{repo}/raw"),
            )),
            _ => None,
        }
    }

    fn name(&self) -> &str {
        "bitbucket"
    }
}
