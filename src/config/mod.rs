mod env_manager;

use crate::completion::{DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::error::{ServiceError, Result};
use crate::github::GITHUB_API_BASE;
use crate::inspector::DEFAULT_LISTING_LIMIT;
use crate::prompts::PromptTemplate;
use crate::visitors::DEFAULT_VISITORS_FILE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use env_manager::{get_env_value, ApiKeys, PLACEHOLDER_API_KEY};

/// Main configuration struct for the service
///
/// Every field has a default, so a config file only needs the values it
/// changes. Environment variables are applied on top of the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Repository host settings
    pub github: GitHubConfig,
    /// Prompt and completion settings
    pub generation: GenerationConfig,
    /// API keys for the external services
    pub api_keys: ApiKeys,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server binds to
    pub bind_address: String,
    /// JSON file holding hashed visitor identifiers
    pub visitors_file: PathBuf,
}

/// Repository host settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API base URL
    pub api_base: String,
    /// Per-request timeout in seconds
    pub http_timeout_secs: u64,
}

/// Prompt and completion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// OpenAI-compatible API base URL
    pub api_base: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum number of paths placed in the prompt
    pub listing_limit: usize,
    /// Deadline for the whole generation flow in seconds
    pub request_timeout_secs: u64,
    /// Template file replacing the built-in template
    pub prompt_template_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            visitors_file: PathBuf::from(DEFAULT_VISITORS_FILE),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: GITHUB_API_BASE.to_string(),
            http_timeout_secs: 30,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            listing_limit: DEFAULT_LISTING_LIMIT,
            request_timeout_secs: 120,
            prompt_template_path: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            github: GitHubConfig::default(),
            generation: GenerationConfig::default(),
            api_keys: ApiKeys::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from the default location if it exists,
    /// then applies environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(get_env_value);
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/readmeservice/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("readmeservice").join("config.toml"))
    }

    /// Parses a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ServiceError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parses TOML config text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ServiceError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Applies overrides read through `lookup` (normally the environment)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_keys.merge(ApiKeys {
            github_token: lookup("GITHUB_TOKEN"),
            llm_api_key: lookup("GROQ_API_KEY"),
        });
        if let Some(base) = lookup("GITHUB_API_BASE_URL") {
            self.github.api_base = base;
        }
        if let Some(base) = lookup("GROQ_API_BASE_URL") {
            self.generation.api_base = base;
        }
        if let Some(model) = lookup("README_MODEL") {
            self.generation.model = model;
        }
        if let Some(file) = lookup("VISITORS_FILE") {
            self.server.visitors_file = PathBuf::from(file);
        }
        if let Some(address) = lookup("BIND_ADDRESS") {
            self.server.bind_address = address;
        }
    }

    /// Checks values that would otherwise fail later at request time
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ServiceError::Config(format!(
                "temperature must be between 0 and 2, got {}",
                self.generation.temperature
            )));
        }
        if self.generation.listing_limit == 0 {
            return Err(ServiceError::Config("listing_limit must be at least 1".into()));
        }
        if self.generation.request_timeout_secs == 0 || self.github.http_timeout_secs == 0 {
            return Err(ServiceError::Config("timeouts must be at least 1 second".into()));
        }
        if self.generation.model.trim().is_empty() {
            return Err(ServiceError::Config("model must not be empty".into()));
        }
        Ok(())
    }

    /// Log level from the command line if given, otherwise from the config
    pub fn log_level_or<'a>(&'a self, flag: Option<&'a str>) -> &'a str {
        flag.filter(|level| !level.trim().is_empty()).unwrap_or(self.log_level.as_str())
    }

    /// Deadline for one generation request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.request_timeout_secs)
    }

    /// Timeout for each GitHub call
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.github.http_timeout_secs)
    }

    /// Prompt template, from the configured file or the built-in default
    pub fn prompt_template(&self) -> Result<PromptTemplate> {
        match &self.generation.prompt_template_path {
            Some(path) => PromptTemplate::from_file(path),
            None => Ok(PromptTemplate::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.generation.model, "llama-3.3-70b-versatile");
        assert_eq!(config.generation.listing_limit, 200);
        assert_eq!(config.server.visitors_file, PathBuf::from("data/visitors.json"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            log_level = "debug"

            [generation]
            model = "llama-3.1-8b-instant"
            temperature = 0.2
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_level_or(None), "debug");
        assert_eq!(config.log_level_or(Some("trace")), "trace");
        assert_eq!(config.generation.model, "llama-3.1-8b-instant");
        assert_eq!(config.generation.listing_limit, 200);
        assert_eq!(config.github.api_base, GITHUB_API_BASE);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        assert!(matches!(Config::from_toml("server = 3"), Err(ServiceError::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("GITHUB_API_BASE_URL", "http://localhost:9999"),
            ("GROQ_API_KEY", "gsk_test"),
            ("VISITORS_FILE", "/tmp/v.json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.github.api_base, "http://localhost:9999");
        assert_eq!(config.api_keys.llm_api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.server.visitors_file, PathBuf::from("/tmp/v.json"));
        assert_eq!(config.generation.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.generation.temperature = 3.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.generation.listing_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_template_file_is_config_error() {
        let mut config = Config::default();
        config.generation.prompt_template_path = Some(PathBuf::from("/nonexistent/template.md"));
        assert!(matches!(config.prompt_template(), Err(ServiceError::Config(_))));
    }
}
