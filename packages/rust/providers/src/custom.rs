//! User-configured hosting providers.

use regex::Regex;

use pdblink_shared::{CustomProviderConfig, PdbLinkError, Result};

use super::{FILENAME_PLACEHOLDER, HostingProvider, ProviderMatch, REVISION_PLACEHOLDER};

/// A provider defined by a regex over the remote URL and a raw-content template.
///
/// Named captures in `pattern` are expanded into `raw_url` as `{name}`;
/// `{revision}` and `{filename}` are left for the index builder.
pub struct CustomProvider {
    name: String,
    pattern: Regex,
    raw_url: String,
}

impl CustomProvider {
    pub fn new(name: impl Into<String>, pattern: &str, raw_url: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let pattern = Regex::new(pattern).map_err(|e| {
            PdbLinkError::config(format!("provider '{name}' has an invalid pattern: {e}"))
        })?;

        Ok(Self {
            name,
            pattern,
            raw_url: raw_url.into(),
        })
    }

    pub fn from_config(config: &CustomProviderConfig) -> Result<Self> {
        Self::new(&config.name, &config.pattern, &config.raw_url)
    }
}

impl HostingProvider for CustomProvider {
    fn matches(&self, url: &str) -> Option<ProviderMatch> {
        let caps = self.pattern.captures(url.trim())?;

        let mut raw_url = self.raw_url.clone();
        for group in self.pattern.capture_names().flatten() {
            let placeholder = format!("{{{group}}}");
            if placeholder == REVISION_PLACEHOLDER || placeholder == FILENAME_PLACEHOLDER {
                continue;
            }
            let value = caps.name(group).map_or("", |m| m.as_str());
            raw_url = raw_url.replace(&placeholder, value);
        }

        Some(ProviderMatch::flat(&self.name, url, raw_url))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
