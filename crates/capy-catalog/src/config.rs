//! Launcher configuration, stored as JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Default preset order (lowercase app keys).
    pub apps_order: Vec<String>,
    /// Preset order per locale ("zh_CN") or language ("zh").
    pub apps_order_by_locale: HashMap<String, Vec<String>>,
    pub search_delay_ms: u64,
    pub refresh_delay_ms: u64,
    /// Keep rendered icons on disk between runs.
    pub icon_cache_enabled: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            apps_order: [
                "firefox",
                "chromium",
                "thunderbird",
                "org.gnome.nautilus",
                "org.gnome.terminal",
                "org.gnome.settings",
                "libreoffice-writer",
                "gimp",
                "vlc",
                "code",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            apps_order_by_locale: HashMap::new(),
            search_delay_ms: 150,
            refresh_delay_ms: 500,
            icon_cache_enabled: true,
        }
    }
}

impl CatalogConfig {
    /// Load from config file, or return default if missing or invalid.
    pub fn load(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Invalid config {}: {}, using defaults", path.display(), e);
            Self::default()
        })
    }

    /// Save to config file
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "search_delay_ms": 300 }"#).unwrap();

        let config = CatalogConfig::load(&path);
        assert_eq!(config.search_delay(), Duration::from_millis(300));
        assert_eq!(config.refresh_delay(), Duration::from_millis(500));
        assert!(config.apps_order.contains(&"firefox".to_string()));
    }

    #[test]
    fn test_missing_or_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let missing = CatalogConfig::load(&dir.path().join("nope.json"));
        assert_eq!(missing.search_delay_ms, 150);

        let path = dir.path().join("bad.json");
        fs::write(&path, "[1, 2").unwrap();
        assert_eq!(CatalogConfig::load(&path).refresh_delay_ms, 500);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.json");
        let mut config = CatalogConfig::default();
        config
            .apps_order_by_locale
            .insert("de".into(), vec!["thunderbird".into()]);
        config.save(&path).unwrap();

        let loaded = CatalogConfig::load(&path);
        assert_eq!(loaded.apps_order_by_locale["de"], ["thunderbird".to_string()]);
    }
}
