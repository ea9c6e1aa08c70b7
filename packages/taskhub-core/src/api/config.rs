use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Default API URL
const DEFAULT_API_URL: &str = "https://api.taskhub.dev/v1";

/// Environment variable name for API URL override
const ENV_API_URL: &str = "TASKHUB_API_URL";

/// Configuration file structure
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    api: Option<ApiSection>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiSection {
    /// API endpoint URL (e.g., "https://your-instance.example.com/v1")
    url: Option<String>,
}

/// Runtime API configuration
#[derive(Debug, Clone)]
pub struct ApiEndpointConfig {
    /// Base URL for API calls
    pub api_url: String,
    /// Source of the configuration (for logging)
    pub source: ConfigSource,
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Using default hardcoded values
    Default,
    /// Loaded from environment variable
    Environment,
    /// Loaded from config file
    ConfigFile,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::ConfigFile => write!(f, "config file"),
        }
    }
}

/// Get the path to the configuration file
fn get_config_file_path() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|p| p.join("taskhub").join("config.toml"))
}

/// Get the config file path as a display string
pub fn get_config_file_path_string() -> String {
    get_config_file_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "~/.config/taskhub/config.toml".to_string())
}

/// Load configuration from the config file
fn load_config_file() -> Option<ConfigFile> {
    let path = get_config_file_path()?;

    if !path.exists() {
        return None;
    }

    match fs::read_to_string(&path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => {
                tracing::debug!("Loaded config from {:?}", path);
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file {:?}: {}", path, e);
                None
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read config file {:?}: {}", path, e);
            None
        }
    }
}

/// Load API endpoint configuration with priority:
/// 1. Environment variable (TASKHUB_API_URL)
/// 2. Config file (~/.config/taskhub/config.toml)
/// 3. Default values
pub fn load_api_config() -> ApiEndpointConfig {
    // Priority 1: Environment variable
    if let Ok(url) = std::env::var(ENV_API_URL) {
        let url = url.trim().trim_end_matches('/');
        if !url.is_empty() {
            tracing::debug!("Using API URL from environment variable: {}", url);
            return ApiEndpointConfig {
                api_url: url.to_string(),
                source: ConfigSource::Environment,
            };
        }
    }

    // Priority 2: Config file
    if let Some(config) = load_config_file() {
        if let Some(api) = config.api {
            let api_url = api
                .url
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty());

            if let Some(url) = api_url {
                tracing::debug!("Using API URL from config file: {}", url);
                return ApiEndpointConfig {
                    api_url: url,
                    source: ConfigSource::ConfigFile,
                };
            }
        }
    }

    // Priority 3: Defaults
    ApiEndpointConfig {
        api_url: DEFAULT_API_URL.to_string(),
        source: ConfigSource::Default,
    }
}

/// Generate an example config.toml (shown by `taskhub config`)
pub fn generate_example_config() -> String {
    format!(
        "[api]\n\
         # API endpoint URL\n\
         url = \"{}\"\n",
        DEFAULT_API_URL
    )
}

/// Parse a config file's contents. Split out of `load_config_file` so the
/// format can be checked without touching the filesystem.
fn parse_config(content: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_config_parses() {
        let config = parse_config(&generate_example_config()).unwrap();
        assert_eq!(
            config.api.unwrap().url.as_deref(),
            Some(DEFAULT_API_URL)
        );
    }

    #[test]
    fn empty_config_is_valid() {
        let config = parse_config("").unwrap();
        assert!(config.api.is_none());
    }
}
