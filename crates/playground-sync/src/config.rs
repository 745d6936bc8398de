//! Configuration management
//!
//! Stores deployment mode, data location and generation settings in
//! ~/.config/prompt-playground/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR: &str = "prompt-playground";
const CONFIG_FILE: &str = "config.toml";
const API_KEY_ENV: &str = "PLAYGROUND_GENERATION_API_KEY";

/// Which record store backs the repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    /// Records live in the remote record database
    #[default]
    Cloud,
    /// Records live in a single local blob
    Local,
}

/// Generation backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Upper bound for a single generation call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Read from the environment, never written to disk
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_library_file() -> String {
    "library.json".to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaygroundConfig {
    #[serde(default)]
    pub mode: DeploymentMode,
    /// Overrides the platform data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_library_file")]
    pub library_file: String,
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            mode: DeploymentMode::default(),
            data_dir: None,
            library_file: default_library_file(),
            generation: GenerationConfig::default(),
        }
    }
}

impl PlaygroundConfig {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join(CONFIG_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load config from the default location, or create default
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            toml::from_str(&content).with_context(|| "Failed to parse config file")?
        } else {
            Self::default()
        };

        config.generation.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        Ok(config)
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {:?}", dir))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    /// Directory the local library blob lives in
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(dirs::data_dir()
                .context("Could not determine data directory")?
                .join(CONFIG_DIR)),
        }
    }

    pub fn library_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(&self.library_file))
    }
}
