//! Aggregator configuration
//!
//! ```toml
//! locked = false
//! debounce_delay_ms = 1000
//! quiet_window_ms = 500
//!
//! [[providers]]
//! id = "na-desktop"
//! readable = true
//! writable = true
//! locked_by_admin = false
//! ```

use crate::debounce::{DEFAULT_DELAY, DEFAULT_QUIET_WINDOW};
use crate::error::{PivotError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Per-provider settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider id
    pub id: String,

    /// Read items from this provider
    pub readable: bool,

    /// User allows writes to this provider
    pub writable: bool,

    /// Administrator forbids writes to this provider
    pub locked_by_admin: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            readable: true,
            writable: true,
            locked_by_admin: false,
        }
    }
}

impl ProviderConfig {
    /// Settings for `id`: readable, writable, unlocked
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// With readability
    #[inline]
    #[must_use]
    pub fn with_readable(mut self, readable: bool) -> Self {
        self.readable = readable;
        self
    }

    /// With user writability
    #[inline]
    #[must_use]
    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// With administrator lock
    #[inline]
    #[must_use]
    pub fn with_locked_by_admin(mut self, locked: bool) -> Self {
        self.locked_by_admin = locked;
        self
    }
}

/// Pivot configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotConfig {
    /// Whole configuration locked by the administrator
    pub locked: bool,

    /// Reload timer period in milliseconds
    pub debounce_delay_ms: u64,

    /// Quiet window in milliseconds
    pub quiet_window_ms: u64,

    /// Provider settings; providers not listed use the defaults
    pub providers: Vec<ProviderConfig>,
}

impl Default for PivotConfig {
    fn default() -> Self {
        Self {
            locked: false,
            debounce_delay_ms: duration_ms(DEFAULT_DELAY),
            quiet_window_ms: duration_ms(DEFAULT_QUIET_WINDOW),
            providers: Vec::new(),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl PivotConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML
    ///
    /// # Errors
    ///
    /// [`PivotError::Config`] when the document is not valid.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML file
    ///
    /// # Errors
    ///
    /// [`PivotError::Io`] when the file cannot be read,
    /// [`PivotError::Config`] when it is not valid.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PivotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), providers = config.providers.len(), "configuration loaded");
        Ok(config)
    }

    /// With administrator lock
    #[inline]
    #[must_use]
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// With reload timer period
    #[inline]
    #[must_use]
    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay_ms = duration_ms(delay);
        self
    }

    /// With quiet window
    #[inline]
    #[must_use]
    pub fn with_quiet_window(mut self, quiet: Duration) -> Self {
        self.quiet_window_ms = duration_ms(quiet);
        self
    }

    /// With settings for one provider, replacing earlier ones
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.providers.retain(|p| p.id != provider.id);
        self.providers.push(provider);
        self
    }

    /// Reload timer period
    #[inline]
    #[must_use]
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    /// Quiet window
    #[inline]
    #[must_use]
    pub fn quiet_window(&self) -> Duration {
        Duration::from_millis(self.quiet_window_ms)
    }

    /// Settings of provider `id`, defaults if not listed
    #[must_use]
    pub fn provider(&self, id: &str) -> ProviderConfig {
        self.providers
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .unwrap_or_else(|| ProviderConfig::new(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = PivotConfig::new();
        assert!(!config.locked);
        assert_eq!(config.debounce_delay(), Duration::from_secs(1));
        assert_eq!(config.quiet_window(), Duration::from_millis(500));
        assert_eq!(config.provider("any"), ProviderConfig::new("any"));
    }

    #[test]
    fn config_from_toml() {
        let config = PivotConfig::from_toml_str(
            r#"
            locked = true
            quiet_window_ms = 250

            [[providers]]
            id = "na-gconf"
            readable = false

            [[providers]]
            id = "na-desktop"
            locked_by_admin = true
            "#,
        )
        .unwrap();
        assert!(config.locked);
        assert_eq!(config.debounce_delay_ms, 1000);
        assert_eq!(config.quiet_window(), Duration::from_millis(250));
        assert!(!config.provider("na-gconf").readable);
        assert!(config.provider("na-gconf").writable);
        assert!(config.provider("na-desktop").locked_by_admin);
    }

    #[test]
    fn config_rejects_bad_toml() {
        let err = PivotConfig::from_toml_str("locked = \"maybe\"").unwrap_err();
        assert!(matches!(err, PivotError::Config(_)));
    }

    #[test]
    fn config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pivot.toml");
        let config = PivotConfig::new()
            .with_debounce_delay(Duration::from_millis(1500))
            .with_provider(ProviderConfig::new("na-xml").with_writable(false));
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();
        assert_eq!(PivotConfig::load(&path).unwrap(), config);

        let missing = PivotConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, PivotError::Io { .. }));
    }

    #[test]
    fn with_provider_replaces() {
        let config = PivotConfig::new()
            .with_provider(ProviderConfig::new("a").with_writable(false))
            .with_provider(ProviderConfig::new("a").with_locked_by_admin(true));
        assert_eq!(config.providers.len(), 1);
        assert!(config.provider("a").writable);
        assert!(config.provider("a").locked_by_admin);
    }
}
