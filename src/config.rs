use crate::error::{CardScanError, Result};
use card_scan_common::modifiers::{DEFAULT_AMBIGUOUS_PREFIXES, DEFAULT_NAME_MODIFIERS};
use card_scan_common::NameModifiers;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
const CATALOG_API_KEY_ENV: &str = "POKEMONTCG_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Gemini APIキー
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,

    pub catalog_url: String,
    pub catalog_api_key: Option<String>,
    pub catalog_page_size: u32,

    pub ocr_language: String,
    pub tesseract_path: String,

    /// ポケモンカード判定を要求する
    pub strict_card_check: bool,
    pub name_modifiers: Vec<String>,
    pub ambiguous_prefixes: Vec<String>,

    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CardScanError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("card-scan").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".into(),
            temperature: 0.1,
            timeout_seconds: 60,
            catalog_url: "https://api.pokemontcg.io/v2".into(),
            catalog_api_key: None,
            catalog_page_size: 20,
            ocr_language: "eng".into(),
            tesseract_path: "tesseract".into(),
            strict_card_check: true,
            name_modifiers: DEFAULT_NAME_MODIFIERS.iter().map(|s| s.to_string()).collect(),
            ambiguous_prefixes: DEFAULT_AMBIGUOUS_PREFIXES.iter().map(|s| s.to_string()).collect(),
            log_level: "info".into(),
        }
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        if let Some(key) = env_value(GEMINI_API_KEY_ENV) {
            return Ok(key);
        }

        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(CardScanError::MissingApiKey)
    }

    /// カタログAPIキー（なくても検索は可能）
    pub fn get_catalog_api_key(&self) -> Option<String> {
        env_value(CATALOG_API_KEY_ENV).or_else(|| self.catalog_api_key.clone())
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn name_modifiers(&self) -> NameModifiers {
        NameModifiers::new(&self.name_modifiers, &self.ambiguous_prefixes)
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert!(config.temperature <= 0.2);
        assert_eq!(config.ocr_language, "eng");
        assert!(config.strict_card_check);
        assert!(config.name_modifiers.iter().any(|m| m == "VMAX"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"model": "gemini-1.5-pro", "catalogPageSize": 5}"#).unwrap();
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.catalog_page_size, 5);
        assert_eq!(config.catalog_url, "https://api.pokemontcg.io/v2");
        assert_eq!(config.tesseract_path, "tesseract");
    }

    #[test]
    fn test_name_modifiers_from_config() {
        let config = Config {
            name_modifiers: vec!["Prime".into()],
            ambiguous_prefixes: vec![],
            ..Config::default()
        };
        let modifiers = config.name_modifiers();
        assert_eq!(modifiers.strip("Ampharos Prime").name, "Ampharos");
        assert_eq!(modifiers.strip("Pikachu VMAX").name, "Pikachu VMAX");
    }
}
