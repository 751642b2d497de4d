use crate::config::Config;
use crate::url::normalize_host;
use crate::ConfigError;
use url::Url;

/// The dev host a site is exported from and the target host it is exported to
///
/// Both hosts are normalized without a trailing slash. Construction is the
/// only place the "both present" invariant is checked, and it happens before
/// any network activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    dev_host: String,
    target_host: String,
    target_url: Url,
}

impl Site {
    /// Builds a site descriptor from raw host strings
    ///
    /// # Returns
    ///
    /// * `Ok(Site)` - Both hosts are present and valid
    /// * `Err(ConfigError::MissingField)` - One of the hosts is empty
    /// * `Err(ConfigError::InvalidUrl)` - One of the hosts is not an absolute HTTP(S) URL
    pub fn new(dev_host: &str, target_host: &str) -> Result<Self, ConfigError> {
        if dev_host.trim().is_empty() {
            return Err(ConfigError::MissingField("site"));
        }
        if target_host.trim().is_empty() {
            return Err(ConfigError::MissingField("target-host"));
        }

        let dev_host = normalize_host(dev_host)?;
        let target_host = normalize_host(target_host)?;
        let target_url = Url::parse(&target_host)
            .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", target_host, e)))?;

        Ok(Self {
            dev_host,
            target_host,
            target_url,
        })
    }

    /// Builds a site descriptor from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(&config.site, &config.target_host)
    }

    pub fn dev_host(&self) -> &str {
        &self.dev_host
    }

    pub fn target_host(&self) -> &str {
        &self.target_host
    }

    /// The target host as a parsed URL, used as the base for link resolution
    pub fn target_url(&self) -> &Url {
        &self.target_url
    }

    /// Absolute dev-host URL of a manifest path (`""` is the home page)
    pub fn dev_url(&self, path: &str) -> String {
        format!("{}/{}", self.dev_host, path)
    }

    /// Replaces every literal occurrence of the dev host with the target host
    pub fn retarget(&self, text: &str) -> String {
        text.replace(&self.dev_host, &self.target_host)
    }
}
