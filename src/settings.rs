use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketplaceSettings {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentPlatformSettings {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_max_ubos")]
    pub max_ubos: u32,
    #[serde(default = "default_time_zone")]
    pub marketplace_time_zone: String,
    #[serde(default = "default_house_number_patterns")]
    pub house_number_patterns: BTreeMap<String, String>,
    #[serde(default)]
    pub default_processing_tier: Option<u32>,
    #[serde(default)]
    pub marketplace: MarketplaceSettings,
    #[serde(default)]
    pub payment_platform: PaymentPlatformSettings,
}

fn default_max_ubos() -> u32 {
    4
}

fn default_time_zone() -> String {
    "Europe/Amsterdam".to_string()
}

fn default_house_number_patterns() -> BTreeMap<String, String> {
    // House number after the street name
    let trailing = r"\s([a-zA-Z]*\d+[a-zA-Z]*)$";
    // House number before the street name
    let leading = r"^(\d+[a-zA-Z]?)\s";
    [
        ("NL", trailing),
        ("DE", trailing),
        ("BE", trailing),
        ("FR", leading),
        ("GB", leading),
        ("US", leading),
    ]
    .into_iter()
    .map(|(country, pattern)| (country.to_string(), pattern.to_string()))
    .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            max_ubos: default_max_ubos(),
            marketplace_time_zone: default_time_zone(),
            house_number_patterns: default_house_number_patterns(),
            default_processing_tier: None,
            marketplace: MarketplaceSettings::default(),
            payment_platform: PaymentPlatformSettings::default(),
        }
    }
}

/// Immutable engine parameters, built once per run and passed explicitly.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_ubos: u32,
    pub time_zone: Tz,
    /// ISO-2 country code -> street pattern whose first group is the house number.
    pub house_number_patterns: HashMap<String, Regex>,
    pub default_processing_tier: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_ubos: default_max_ubos(),
            time_zone: Tz::UTC,
            house_number_patterns: HashMap::new(),
            default_processing_tier: None,
        }
    }
}

impl Settings {
    pub fn engine_config(&self) -> Result<EngineConfig> {
        if self.max_ubos == 0 {
            return Err(SyncError::Settings("max_ubos must be at least 1".into()));
        }
        let time_zone: Tz = self.marketplace_time_zone.parse().map_err(|_| {
            SyncError::Settings(format!("unknown time zone: {}", self.marketplace_time_zone))
        })?;
        let mut house_number_patterns = HashMap::new();
        for (country, pattern) in &self.house_number_patterns {
            let re = Regex::new(pattern).map_err(|e| {
                SyncError::Settings(format!("invalid house number pattern for {country}: {e}"))
            })?;
            house_number_patterns.insert(country.to_uppercase(), re);
        }
        Ok(EngineConfig {
            max_ubos: self.max_ubos,
            time_zone,
            house_number_patterns,
            default_processing_tier: self.default_processing_tier,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("shopsync.db")
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("shopsync")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("shopsync")
}

pub fn load_settings() -> Result<Settings> {
    let path = settings_path();
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(&path)?;
    let settings = serde_json::from_str(&content)
        .map_err(|e| SyncError::Settings(format!("{}: {e}", path.display())))?;
    Ok(settings)
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.max_ubos, 4);
        assert_eq!(s.marketplace_time_zone, "Europe/Amsterdam");
        assert!(s.house_number_patterns.contains_key("NL"));
        assert!(s.default_processing_tier.is_none());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test", "max_ubos": 2}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.max_ubos, 2);
        assert_eq!(s.marketplace_time_zone, "Europe/Amsterdam");
        assert!(s.marketplace.base_url.is_empty());
    }

    #[test]
    fn test_engine_config_compiles_patterns() {
        let config = Settings::default().engine_config().unwrap();
        assert_eq!(config.time_zone, chrono_tz::Europe::Amsterdam);
        let nl = &config.house_number_patterns["NL"];
        let caps = nl.captures("Kosterpark 610b").unwrap();
        assert_eq!(&caps[1], "610b");
    }

    #[test]
    fn test_engine_config_rejects_bad_time_zone() {
        let s = Settings {
            marketplace_time_zone: "Mars/Olympus".into(),
            ..Settings::default()
        };
        assert!(matches!(s.engine_config(), Err(SyncError::Settings(_))));
    }

    #[test]
    fn test_engine_config_rejects_bad_pattern() {
        let mut s = Settings::default();
        s.house_number_patterns.insert("XX".into(), "([".into());
        let err = s.engine_config().unwrap_err();
        assert!(err.to_string().contains("XX"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            default_processing_tier: Some(2),
            ..Settings::default()
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let loaded: Settings = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.data_dir, "/tmp/test");
        assert_eq!(loaded.default_processing_tier, Some(2));
        assert_eq!(loaded.house_number_patterns, settings.house_number_patterns);
    }
}
