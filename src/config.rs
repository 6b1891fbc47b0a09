use crate::error::{LessonLensError, Result};
use lesson_lens_common::language::require_language;
use lesson_lens_common::ModelConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// APIキーの環境変数名
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub models: ModelConfig,
    pub default_language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            models: ModelConfig::default(),
            default_language: "en".into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| LessonLensError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("lesson-lens").join("config.json"))
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LessonLensError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    /// 既定言語を変更（カタログにないコードはエラー）
    pub fn set_default_language(&mut self, code: &str) -> Result<()> {
        require_language(code)?;
        self.default_language = code.to_string();
        self.save()
    }
}
