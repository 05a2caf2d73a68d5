use crate::adapters::fangraphs::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::app::presenter::ExportFormat;
use crate::utils::error::{RatingError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings file looked up in the working directory when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "pitcher-rating.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: ProviderSettings,
    pub cache: CacheSettings,
    pub output: OutputSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 60,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub directory: String,
    pub max_age_hours: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: ".cache".to_string(),
            max_age_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub directory: String,
    pub figures_directory: String,
    pub formats: Vec<ExportFormat>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: ".output".to_string(),
            figures_directory: ".figures".to_string(),
            formats: vec![ExportFormat::Json],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub directory: String,
    pub file_name: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: ".logs".to_string(),
            file_name: "pitcher_rating.log".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl Settings {
    /// Explicit path must exist; otherwise `pitcher-rating.toml` is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_SETTINGS_FILE).exists() => {
                Self::from_file(DEFAULT_SETTINGS_FILE)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(&path).map_err(|e| RatingError::Config {
                message: format!(
                    "could not read settings file {}: {}",
                    path.as_ref().display(),
                    e
                ),
            })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RatingError::Config {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RatingError::Config {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.provider.timeout_seconds)
    }

    pub fn cache_max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cache.max_age_hours.min(i32::MAX as u64) as i64)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("provider.base_url", &self.provider.base_url)?;
        validate_positive_number("provider.timeout_seconds", self.provider.timeout_seconds, 1)?;
        validate_non_empty_string("provider.user_agent", &self.provider.user_agent)?;

        if self.cache.enabled {
            validate_path("cache.directory", &self.cache.directory)?;
        }

        validate_path("output.directory", &self.output.directory)?;
        validate_path("output.figures_directory", &self.output.figures_directory)?;
        if self.output.formats.is_empty() {
            return Err(RatingError::InvalidConfigValue {
                field: "output.formats".to_string(),
                value: "[]".to_string(),
                reason: "at least one of json, csv, tsv is required".to_string(),
            });
        }

        validate_path("logging.directory", &self.logging.directory)?;
        validate_path("logging.file_name", &self.logging.file_name)?;

        Ok(())
    }
}
