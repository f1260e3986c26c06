//! Configuration loading from files.
//!
//! The YAML file is layered with `PAGEWRIGHT_` environment variables, using
//! `__` between nested keys (`PAGEWRIGHT_SITE__TITLE`).

use std::path::{Path, PathBuf};

use super::{Config, ConfigError, format_config_error};

/// Default config file name
pub const DEFAULT_CONFIG_FILE: &str = "pagewright.yaml";

impl Config {
    /// Resolve the config path given on the command line, defaulting to `pagewright.yaml`
    pub fn path_from_arg(config_file: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        if config_file.is_relative() {
            Ok(std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file))
        } else {
            Ok(config_file.to_path_buf())
        }
    }

    /// Load the config from a file path
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;

        let settings = config::Config::builder()
            .add_source(config::File::new(path_str, config::FileFormat::Yaml))
            .add_source(
                config::Environment::with_prefix("PAGEWRIGHT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(format_config_error)?;

        let config: Config = settings.try_deserialize().map_err(format_config_error)?;
        config.validate()?;
        Ok(config)
    }
}

/// Directory that relative paths in the config are resolved against.
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
