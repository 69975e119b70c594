//! Azure DevOps (formerly Visual Studio Team Services) hosting provider.
//!
//! Azure DevOps content is resolved server-side by `tf.exe git view` from a
//! collection URL and project name, so matches carry [`StructuredMetadata`]
//! instead of relying on a client-built raw URL.

use super::{HostingProvider, ProviderMatch, StructuredMetadata};
use crate::remote::RemoteUrl;

/// Matches `dev.azure.com`, `*.visualstudio.com` and their SSH endpoints.
pub struct AzureDevOpsProvider;

impl AzureDevOpsProvider {
    /// Resolve `(collection_url, project, repository)` from a parsed remote.
    fn resolve(remote: &RemoteUrl) -> Option<(String, String, String)> {
        let parts = remote.parts();
        let host = remote.host.as_str();

        if host == "dev.azure.com" {
            return match parts.as_slice() {
                [org, project, "_git", repo] => Some((
                    format!("https://dev.azure.com/{org}/"),
                    (*project).to_string(),
                    (*repo).to_string(),
                )),
                _ => None,
            };
        }

        if host == "ssh.dev.azure.com" {
            return match parts.as_slice() {
                ["v3", org, project, repo] => Some((
                    format!("https://dev.azure.com/{org}/"),
                    (*project).to_string(),
                    (*repo).to_string(),
                )),
                _ => None,
            };
        }

        if host == "vs-ssh.visualstudio.com" {
            return match parts.as_slice() {
                ["v3", org, project, repo] => Some((
                    format!("https://{org}.visualstudio.com/"),
                    (*project).to_string(),
                    (*repo).to_string(),
                )),
                _ => None,
            };
        }

        if host.ends_with(".visualstudio.com") {
            return match parts.as_slice() {
                [project, "_git", repo] => Some((
                    format!("https://{host}/"),
                    (*project).to_string(),
                    (*repo).to_string(),
                )),
                [collection, project, "_git", repo] => Some((
                    format!("https://{host}/{collection}/"),
                    (*project).to_string(),
                    (*repo).to_string(),
                )),
                _ => None,
            };
        }

        None
    }
}

impl HostingProvider for AzureDevOpsProvider {
    fn matches(&self, url: &str) -> Option<ProviderMatch> {
        let remote = RemoteUrl::parse(url)?;
        let (collection_url, project, repo) = Self::resolve(&remote)?;

        let raw_url = format!(
            "{collection_url}{project}/_apis/git/repositories/{repo}/items\
             ?path={{filename}}&versionDescriptor.versionType=commit\
             &versionDescriptor.version={{revision}}"
        );

        Some(ProviderMatch {
            provider: self.name().to_string(),
            remote_url: url.to_string(),
            raw_url,
            structured: Some(StructuredMetadata {
                collection_url,
                project,
            }),
        })
    }

    fn name(&self) -> &str {
        "azure-devops"
    }
}
