//! Configuration management

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use config::{Config as ConfigBuilder, ConfigError as BuilderError, Environment, File};
use clap::Args;

/// Default remote API location (local development backend)
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Environment variable that overrides the API base URL on its own
pub const API_URL_ENV: &str = "STROKE_API_URL";

/// Largest image accepted for upload (10 MiB)
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid api configuration: {0}")]
    InvalidApi(String),

    #[error("Invalid build configuration: {0}")]
    InvalidBuild(String),

    #[error("Invalid storage configuration: {0}")]
    InvalidStorage(String),

    #[error("Invalid upload configuration: {0}")]
    InvalidUpload(String),

    #[error("Invalid logging configuration: {0}")]
    InvalidLogging(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

impl From<BuilderError> for ConfigError {
    fn from(err: BuilderError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// Build flavour. Only development builds may use the local login fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    /// Mode implied by how the binary was compiled
    pub fn compiled() -> Self {
        if cfg!(debug_assertions) {
            BuildMode::Development
        } else {
            BuildMode::Production
        }
    }

    /// Combine the configured mode with the compiled one.
    ///
    /// A release binary is always production, whatever the configuration says.
    pub fn effective(self) -> Self {
        match Self::compiled() {
            BuildMode::Production => BuildMode::Production,
            BuildMode::Development => self,
        }
    }

    pub fn is_production(self) -> bool {
        self == BuildMode::Production
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub build: BuildConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration with precedence: CLI args > Environment variables > Config file > Defaults
    pub fn load(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let mut builder = defaults(ConfigBuilder::builder())?;

        // Config file (medium priority)
        if let Some(config_path) = &cli_args.config {
            if !config_path.exists() {
                return Err(ConfigError::FileNotFound(
                    config_path.display().to_string()
                ));
            }
            builder = builder.add_source(File::from(config_path.as_path()));
        }

        // Environment variables, e.g. STROKE__LOGGING__LEVEL=debug
        builder = builder.add_source(
            Environment::with_prefix("STROKE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
        );
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.is_empty() {
                builder = builder.set_override("api.base_url", url)?;
            }
        }

        // CLI arguments (highest priority)
        if let Some(api_url) = &cli_args.api_url {
            builder = builder.set_override("api.base_url", api_url.clone())?;
        }
        if let Some(data_dir) = &cli_args.data_dir {
            builder = builder.set_override("storage.data_dir", data_dir.display().to_string())?;
        }
        if let Some(log_level) = &cli_args.log_level {
            builder = builder.set_override("logging.level", log_level.clone())?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path, on top of the defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let config: Config = defaults(ConfigBuilder::builder())?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults only
    pub fn default_config() -> Result<Self, ConfigError> {
        let config: Config = defaults(ConfigBuilder::builder())?.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()?;
        self.storage.validate()?;
        self.upload.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

fn defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    let data_dir = dirs::data_local_dir()
        .map(|d| d.join("stroke-dashboard"))
        .unwrap_or_else(|| PathBuf::from("./data"));
    let download_dir = dirs::download_dir().unwrap_or_else(|| PathBuf::from("."));
    let build_mode = match BuildMode::compiled() {
        BuildMode::Development => "development",
        BuildMode::Production => "production",
    };

    Ok(builder
        .set_default("api.base_url", DEFAULT_API_URL)?
        .set_default("build.mode", build_mode)?
        .set_default("storage.data_dir", data_dir.display().to_string())?
        .set_default("storage.download_dir", download_dir.display().to_string())?
        .set_default("upload.max_image_bytes", DEFAULT_MAX_IMAGE_BYTES)?
        .set_default("logging.level", "warn")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")?
        .set_default("logging.max_file_size", 10485760)? // 10 MB
        .set_default("logging.max_backups", 5)?)
}

/// Command-line arguments for configuration override
#[derive(Debug, Clone, Default, Args)]
pub struct CliArgs {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the remote API
    #[arg(long, value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Directory holding the persisted session
    #[arg(long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::InvalidApi(format!("base_url is not a valid URL: {}", e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidApi("base_url must use http or https".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    pub mode: BuildMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub download_dir: PathBuf,
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidStorage("data_dir cannot be empty".to_string()));
        }

        if self.download_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidStorage("download_dir cannot be empty".to_string()));
        }

        Ok(())
    }

    /// File backing the local storage entries
    pub fn storage_file(&self) -> PathBuf {
        self.data_dir.join("local_storage.json")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_image_bytes: u64,
}

impl UploadConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_image_bytes == 0 {
            return Err(ConfigError::InvalidUpload("max_image_bytes must be greater than 0".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub log_file: Option<PathBuf>,
    pub max_file_size: usize, // bytes
    pub max_backups: usize,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("level must be one of: {:?}", valid_levels)
            ));
        }

        let valid_formats = ["json", "text"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("format must be one of: {:?}", valid_formats)
            ));
        }

        let valid_outputs = ["stderr", "stdout", "file"];
        if !valid_outputs.contains(&self.output.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("output must be one of: {:?}", valid_outputs)
            ));
        }

        if self.output == "file" && self.log_file.is_none() {
            return Err(ConfigError::InvalidLogging(
                "log_file must be specified when output is 'file'".to_string()
            ));
        }

        if self.max_file_size == 0 {
            return Err(ConfigError::InvalidLogging("max_file_size must be greater than 0".to_string()));
        }

        if self.max_backups == 0 {
            return Err(ConfigError::InvalidLogging("max_backups must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default_config().unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.upload.max_image_bytes, DEFAULT_MAX_IMAGE_BYTES);
        assert_eq!(config.logging.output, "stderr");
        assert_eq!(config.build.mode, BuildMode::compiled());
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"https://stroke.example.org/api\"\n\n[build]\nmode = \"production\"\n"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.api.base_url, "https://stroke.example.org/api");
        assert_eq!(config.build.mode, BuildMode::Production);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_api_validation() {
        assert!(ApiConfig { base_url: "not a url".into() }.validate().is_err());
        assert!(ApiConfig { base_url: "ftp://host/api".into() }.validate().is_err());
        assert!(ApiConfig { base_url: DEFAULT_API_URL.into() }.validate().is_ok());
    }

    #[test]
    fn test_logging_validation() {
        let mut logging = LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
            output: "file".to_string(),
            log_file: None,
            max_file_size: 1024,
            max_backups: 3,
        };
        assert!(logging.validate().is_err());

        logging.log_file = Some(PathBuf::from("./logs/dashboard.log"));
        assert!(logging.validate().is_ok());

        logging.level = "trace".to_string();
        assert!(logging.validate().is_err());
    }

    #[test]
    fn test_upload_validation() {
        assert!(UploadConfig { max_image_bytes: 0 }.validate().is_err());
    }

    #[test]
    fn test_production_is_sticky() {
        assert_eq!(BuildMode::Production.effective(), BuildMode::Production);
        if cfg!(debug_assertions) {
            assert_eq!(BuildMode::Development.effective(), BuildMode::Development);
        } else {
            assert_eq!(BuildMode::Development.effective(), BuildMode::Production);
        }
    }

    #[test]
    fn test_storage_file_location() {
        let storage = StorageConfig {
            data_dir: PathBuf::from("/tmp/stroke"),
            download_dir: PathBuf::from("/tmp"),
        };
        assert_eq!(storage.storage_file(), PathBuf::from("/tmp/stroke/local_storage.json"));
    }
}
