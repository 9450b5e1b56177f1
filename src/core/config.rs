use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::persist::PersistError;

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_settings_name() -> String {
    "settings".to_string()
}

fn default_settings_suffix() -> String {
    "config".to_string()
}

fn default_save_suffix() -> String {
    "save".to_string()
}

fn default_saves_folder() -> String {
    "saves".to_string()
}

/// Static game configuration, usually loaded from a RON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Stamped into every save.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_settings_name")]
    pub settings_name: String,
    #[serde(default = "default_settings_suffix")]
    pub settings_suffix: String,
    #[serde(default = "default_save_suffix")]
    pub save_suffix: String,
    #[serde(default = "default_saves_folder")]
    pub saves_folder: String,
    /// Store namespaces registered for every live game, besides `game`.
    #[serde(default)]
    pub namespaces: Vec<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            settings_name: default_settings_name(),
            settings_suffix: default_settings_suffix(),
            save_suffix: default_save_suffix(),
            saves_folder: default_saves_folder(),
            namespaces: Vec::new(),
        }
    }
}

impl GameConfig {
    pub fn load_from_ron(path: &Path) -> Result<Self, PersistError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<Self, PersistError> {
        Ok(ron::from_str(input)?)
    }
}

fn default_volume() -> f64 {
    1.0
}

/// Player-editable settings persisted beside the saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSettings {
    #[serde(default = "default_volume")]
    pub volume: f64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            volume: default_volume(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fills_defaults() {
        let config = GameConfig::parse_ron(r#"(version: "1.2.0", namespaces: ["flags"])"#).unwrap();
        assert_eq!(config.version, "1.2.0");
        assert_eq!(config.settings_name, "settings");
        assert_eq!(config.saves_folder, "saves");
        assert_eq!(config.namespaces, vec!["flags".to_string()]);
    }

    #[test]
    fn parse_error_is_reported() {
        assert!(matches!(
            GameConfig::parse_ron("(version: 3"),
            Err(PersistError::RonDe(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.ron");
        std::fs::write(&path, "()").unwrap();
        assert_eq!(GameConfig::load_from_ron(&path).unwrap(), GameConfig::default());
    }
}
