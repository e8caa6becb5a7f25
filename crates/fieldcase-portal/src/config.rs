//! Portal connection settings

use serde::{Deserialize, Serialize};

/// Default sharing REST root
pub const DEFAULT_PORTAL_URL: &str = "https://www.arcgis.com/sharing/rest";
/// Default referer sent with token requests
pub const DEFAULT_REFERER: &str = "https://www.arcgis.com";

/// Portal connection settings
///
/// The password is never read from or written to configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Sharing REST root, e.g. `https://www.arcgis.com/sharing/rest`
    pub url: String,
    /// Account name; anonymous access when absent
    pub username: Option<String>,
    /// Account password
    #[serde(skip)]
    pub password: Option<String>,
    /// Referer the token is bound to
    pub referer: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl PortalConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With portal URL
    #[inline]
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// With credentials
    #[inline]
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// URL with any trailing slash removed
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PORTAL_URL.to_string(),
            username: None,
            password: None,
            referer: DEFAULT_REFERER.to_string(),
            timeout_secs: 60,
        }
    }
}
