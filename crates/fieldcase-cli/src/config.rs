//! `fieldcase.toml` loading
//!
//! ```toml
//! [portal]
//! url = "https://www.arcgis.com/sharing/rest"
//! username = "maps.data"
//! timeout_secs = 60
//!
//! [migration]
//! mode = "safe"
//! case_policy = "lowercase"
//!
//! [migration.extra_keys]
//! xAxisField = "field"
//! ```
//!
//! The password is only taken from `FIELDCASE_PASSWORD`.

use anyhow::{Context, Result};
use fieldcase_core::MigrationConfig;
use fieldcase_portal::PortalConfig;
use serde::Deserialize;
use std::path::Path;

/// Config file looked up in the working directory when none is given
pub(crate) const DEFAULT_CONFIG_FILE: &str = "fieldcase.toml";

pub(crate) const ENV_PORTAL_URL: &str = "FIELDCASE_PORTAL_URL";
pub(crate) const ENV_USERNAME: &str = "FIELDCASE_USERNAME";
pub(crate) const ENV_PASSWORD: &str = "FIELDCASE_PASSWORD";

/// Settings from file and environment
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) portal: PortalConfig,
    pub(crate) migration: MigrationConfig,
}

impl Settings {
    /// Load settings, then apply environment overrides
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::read(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::read(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        settings.apply_env(|name| std::env::var(name).ok());
        Ok(settings)
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let settings = Self::from_toml(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(settings)
    }

    pub(crate) fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub(crate) fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_PORTAL_URL) {
            self.portal.url = url;
        }
        if let Some(username) = lookup(ENV_USERNAME) {
            self.portal.username = Some(username);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.portal.password = Some(password);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcase_core::{CasePolicy, KeyCategory, ScopeMode};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn parses_full_file() {
        let settings = Settings::from_toml(
            r#"
            [portal]
            url = "https://gis.example.org/portal/sharing/rest"
            username = "maps.data"
            timeout_secs = 30

            [migration]
            mode = "unsafe"
            case_policy = "authoritative"
            retarget = "abcdefabcdefabcdefabcdefabcdefab"

            [migration.extra_keys]
            xAxisField = "field"
            "#,
        )
        .unwrap();

        assert_eq!(settings.portal.username.as_deref(), Some("maps.data"));
        assert_eq!(settings.portal.timeout_secs, 30);
        assert_eq!(settings.migration.mode, ScopeMode::Unsafe);
        assert_eq!(settings.migration.case_policy, CasePolicy::Authoritative);
        assert_eq!(settings.migration.extra_keys.get("xAxisField"), Some(&KeyCategory::Field));
    }

    #[test]
    fn empty_file_is_default() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.migration, MigrationConfig::default());
        assert_eq!(settings.portal, PortalConfig::default());
    }

    #[test]
    fn password_in_file_is_ignored() {
        let settings = Settings::from_toml("[portal]\npassword = \"hunter2\"\n").unwrap();
        assert_eq!(settings.portal.password, None);
    }

    #[test]
    fn environment_overrides_file() {
        let mut settings = Settings::from_toml("[portal]\nusername = \"file-user\"\n").unwrap();
        let env: HashMap<&str, &str> =
            [(ENV_USERNAME, "env-user"), (ENV_PASSWORD, "secret")].into();
        settings.apply_env(|name| env.get(name).map(|v| (*v).to_string()));

        assert_eq!(settings.portal.username.as_deref(), Some("env-user"));
        assert_eq!(settings.portal.password.as_deref(), Some("secret"));
    }

    #[test]
    fn explicit_missing_file_fails() {
        assert!(Settings::load(Some(Path::new("/nonexistent/fieldcase.toml"))).is_err());
    }
}
