//! Engine configuration
//!
//! [`DiscoveryConfig`] is loaded from TOML, overridden from the environment
//! and validated once at startup. Every field has a default, so an empty file
//! is a valid configuration.

use crate::error::ConfigError;
use discovery_facets::{SurfaceKind, SurfaceProfile, DEFAULT_WINDOW};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding [`BackendConfig::base_url`]
pub const ENV_BASE_URL: &str = "DISCOVERY_BASE_URL";
/// Environment variable overriding [`DiscoveryConfig::log_filter`]
pub const ENV_LOG: &str = "DISCOVERY_LOG";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Backend endpoints
    pub backend: BackendConfig,
    /// Per-surface overrides keyed by surface name (`flash-sale`, ...)
    pub surfaces: HashMap<String, SurfaceConfig>,
    /// Page buttons shown by the pagination bar (odd)
    pub pagination_window: u32,
    /// Capacity of each category store cache
    pub category_cache_capacity: u64,
    /// Default `tracing` filter directive
    pub log_filter: String,
}

impl DiscoveryConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns `ConfigError::Parse` for malformed TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a file, apply environment overrides and validate
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?.with_env_overrides();
        config.validate()?;
        tracing::debug!(path = %path.display(), base_url = %config.backend.base_url, "configuration loaded");
        Ok(config)
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup` (an environment stand-in)
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.backend.base_url = base_url;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }
        self
    }

    /// Check invariants
    ///
    /// # Errors
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if self.pagination_window == 0 || self.pagination_window % 2 == 0 {
            return Err(ConfigError::InvalidWindow(self.pagination_window));
        }
        if self.category_cache_capacity == 0 {
            return Err(ConfigError::ZeroCacheCapacity);
        }
        if let Some(unknown) = self
            .surfaces
            .keys()
            .find(|name| name.parse::<SurfaceKind>().is_err())
        {
            return Err(ConfigError::UnknownSurface(unknown.clone()));
        }
        for kind in SurfaceKind::ALL {
            if self.profile(kind).page_size == 0 {
                return Err(ConfigError::ZeroPageSize(kind));
            }
        }
        Ok(())
    }

    /// Surface profile with this configuration's overrides applied
    #[must_use]
    pub fn profile(&self, kind: SurfaceKind) -> SurfaceProfile {
        let mut profile = SurfaceProfile::for_kind(kind);
        if let Some(overrides) = self.surfaces.get(kind.as_str()) {
            if let Some(page_size) = overrides.page_size {
                profile = profile.with_page_size(page_size);
            }
            if let Some(status) = &overrides.status {
                profile = profile.with_status(status.clone());
            }
        }
        profile
    }

    /// With backend base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.backend.base_url = base_url.into();
        self
    }

    /// With pagination window width
    #[inline]
    #[must_use]
    pub fn with_pagination_window(mut self, width: u32) -> Self {
        self.pagination_window = width;
        self
    }

    /// With page size for one surface
    #[must_use]
    pub fn with_page_size(mut self, kind: SurfaceKind, page_size: u32) -> Self {
        self.surfaces.entry(kind.as_str().to_string()).or_default().page_size = Some(page_size);
        self
    }

    /// With listing status for one surface
    #[must_use]
    pub fn with_status(mut self, kind: SurfaceKind, status: impl Into<String>) -> Self {
        self.surfaces.entry(kind.as_str().to_string()).or_default().status = Some(status.into());
        self
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            surfaces: HashMap::new(),
            pagination_window: DEFAULT_WINDOW,
            category_cache_capacity: 1_024,
            log_filter: "info".to_string(),
        }
    }
}

/// Backend endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL every path is joined to
    pub base_url: String,
    /// Category listing path
    pub categories_path: String,
    /// Brand listing path
    pub brands_path: String,
    /// Product listing path
    pub products_path: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl BackendConfig {
    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            categories_path: "/categories".to_string(),
            brands_path: "/brands".to_string(),
            products_path: "/products".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Per-surface overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Page size sent as `limit`
    pub page_size: Option<u32>,
    /// Listing status sent as `status`
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = DiscoveryConfig::from_toml_str("").unwrap();
        assert_eq!(config, DiscoveryConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn surface_overrides_apply_to_profiles() {
        let config = DiscoveryConfig::from_toml_str(
            r#"
            pagination_window = 7

            [backend]
            base_url = "https://shop.example/api"
            timeout_secs = 3

            [surfaces.flash-sale]
            page_size = 12
            status = "ACTIVE"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.timeout(), Duration::from_secs(3));
        let sale = config.profile(SurfaceKind::FlashSale);
        assert_eq!(sale.page_size, 12);
        assert_eq!(sale.status.as_deref(), Some("ACTIVE"));
        assert_eq!(config.profile(SurfaceKind::Search).page_size, 20);
    }

    #[test]
    fn validation_rules() {
        let base = DiscoveryConfig::new();
        assert!(matches!(
            base.clone().with_base_url(" ").validate(),
            Err(ConfigError::EmptyBaseUrl)
        ));
        assert!(matches!(
            base.clone().with_pagination_window(4).validate(),
            Err(ConfigError::InvalidWindow(4))
        ));
        assert!(matches!(
            base.clone().with_pagination_window(0).validate(),
            Err(ConfigError::InvalidWindow(0))
        ));
        assert!(matches!(
            base.clone().with_page_size(SurfaceKind::Search, 0).validate(),
            Err(ConfigError::ZeroPageSize(SurfaceKind::Search))
        ));
        let uncached = DiscoveryConfig {
            category_cache_capacity: 0,
            ..base.clone()
        };
        assert!(matches!(uncached.validate(), Err(ConfigError::ZeroCacheCapacity)));
        let typo = DiscoveryConfig::from_toml_str("[surfaces.flashsale]\npage_size = 5\n").unwrap();
        assert!(matches!(typo.validate(), Err(ConfigError::UnknownSurface(name)) if name == "flashsale"));
    }

    #[test]
    fn environment_overrides() {
        let config = DiscoveryConfig::new().with_overrides_from(|key| match key {
            ENV_BASE_URL => Some("http://staging/api".to_string()),
            _ => None,
        });
        assert_eq!(config.backend.base_url, "http://staging/api");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("discovery.toml");
        std::fs::write(&path, "pagination_window = 3\n").unwrap();
        let config = DiscoveryConfig::load(&path).unwrap();
        assert_eq!(config.pagination_window, 3);

        let missing = DiscoveryConfig::load(dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
