//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::llm::{DEFAULT_HOST, DEFAULT_MODEL, ModelParams};

/// Bookgraph configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub generation: ModelParams,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub host: String,
    pub model: String,
    pub timeout_secs: u64,
    pub min_interval_ms: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Characters of section text handed to the context-aware recheck
    pub context_chars: usize,
    /// Log progress every N concepts or sections
    pub progress_every: usize,
    /// Sections shorter than this are skipped during concept extraction
    pub min_section_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub results_dir: PathBuf,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 600,
            min_interval_ms: 1200,
            max_attempts: 5,
            backoff_ms: 1500,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            context_chars: 2000,
            progress_every: 25,
            min_section_chars: 100,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
        }
    }
}

/// Keys accepted by [`Config::get`] and [`Config::set`]
pub const CONFIG_KEYS: &[&str] = &[
    "llm.host",
    "llm.model",
    "llm.timeout_secs",
    "llm.min_interval_ms",
    "llm.max_attempts",
    "llm.backoff_ms",
    "generation.num_tokens",
    "generation.temperature",
    "generation.allow_thinking",
    "generation.keep_alive",
    "generation.stop",
    "pipeline.context_chars",
    "pipeline.progress_every",
    "pipeline.min_section_chars",
    "storage.results_dir",
];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("BOOKGRAPH_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("bookgraph")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file (or defaults), then apply environment overrides
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file, or defaults if it doesn't exist
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `OLLAMA_HOST`, `OLLAMA_MODEL` and `RESULTS_DIR` overrides
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("OLLAMA_HOST").filter(|v| !v.trim().is_empty()) {
            self.llm.host = host;
        }
        if let Some(model) = lookup("OLLAMA_MODEL").filter(|v| !v.trim().is_empty()) {
            self.llm.model = model;
        }
        if let Some(dir) = lookup("RESULTS_DIR").filter(|v| !v.trim().is_empty()) {
            self.storage.results_dir = PathBuf::from(dir);
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create config directory: {}", dir.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llm.host.trim().is_empty() {
            return Err(anyhow!("llm.host must not be empty"));
        }
        if self.llm.model.trim().is_empty() {
            return Err(anyhow!("llm.model must not be empty"));
        }
        if self.llm.max_attempts == 0 {
            return Err(anyhow!("llm.max_attempts must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "llm.host" => Ok(self.llm.host.clone()),
            "llm.model" => Ok(self.llm.model.clone()),
            "llm.timeout_secs" => Ok(self.llm.timeout_secs.to_string()),
            "llm.min_interval_ms" => Ok(self.llm.min_interval_ms.to_string()),
            "llm.max_attempts" => Ok(self.llm.max_attempts.to_string()),
            "llm.backoff_ms" => Ok(self.llm.backoff_ms.to_string()),

            "generation.num_tokens" => Ok(self.generation.num_tokens.to_string()),
            "generation.temperature" => Ok(self.generation.temperature.to_string()),
            "generation.allow_thinking" => Ok(self.generation.allow_thinking.to_string()),
            "generation.keep_alive" => Ok(self.generation.keep_alive.clone()),
            "generation.stop" => Ok(self.generation.stop.join(", ")),

            "pipeline.context_chars" => Ok(self.pipeline.context_chars.to_string()),
            "pipeline.progress_every" => Ok(self.pipeline.progress_every.to_string()),
            "pipeline.min_section_chars" => Ok(self.pipeline.min_section_chars.to_string()),

            "storage.results_dir" => Ok(self.storage.results_dir.display().to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `bookgraph config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "llm.host" | "llm.model" if value.trim().is_empty() => {
                return Err(anyhow!("{} must not be empty", key));
            }
            "llm.host" => {
                self.llm.host = value.trim().to_string();
            }
            "llm.model" => {
                self.llm.model = value.trim().to_string();
            }
            "llm.timeout_secs" => {
                self.llm.timeout_secs = parse_value(key, value)?;
            }
            "llm.min_interval_ms" => {
                self.llm.min_interval_ms = parse_value(key, value)?;
            }
            "llm.max_attempts" => {
                let attempts: u32 = parse_value(key, value)?;
                if attempts == 0 {
                    return Err(anyhow!("llm.max_attempts must be at least 1"));
                }
                self.llm.max_attempts = attempts;
            }
            "llm.backoff_ms" => {
                self.llm.backoff_ms = parse_value(key, value)?;
            }

            "generation.num_tokens" => {
                self.generation.num_tokens = parse_value(key, value)?;
            }
            "generation.temperature" => {
                let temp: f64 = parse_value(key, value)?;
                if !(0.0..=2.0).contains(&temp) {
                    return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
                }
                self.generation.temperature = temp;
            }
            "generation.allow_thinking" => {
                self.generation.allow_thinking = parse_value(key, value)?;
            }
            "generation.keep_alive" => {
                self.generation.keep_alive = value.trim().to_string();
            }
            "generation.stop" => {
                self.generation.stop = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }

            "pipeline.context_chars" => {
                self.pipeline.context_chars = parse_value(key, value)?;
            }
            "pipeline.progress_every" => {
                self.pipeline.progress_every = parse_value(key, value)?;
            }
            "pipeline.min_section_chars" => {
                self.pipeline.min_section_chars = parse_value(key, value)?;
            }

            "storage.results_dir" => {
                self.storage.results_dir = PathBuf::from(value.trim());
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `bookgraph config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        CONFIG_KEYS
            .iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

fn parse_value<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {} value: {}", key, value))
}
