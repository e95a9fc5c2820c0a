mod adapter;
mod model;
mod raw;

use std::path::{Path, PathBuf};

pub use model::{Config, Service, ServiceMode};

/// File names probed by [`load_from_dir`], in order.
pub const DEFAULT_FILENAMES: [&str; 3] = ["treehouse.yaml", "treehouse.yml", "treehouse.toml"];

/// Error type for configuration parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[cfg(feature = "yaml")]
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[cfg(feature = "toml")]
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no config file found in {0}")]
    NotFound(PathBuf),

    #[error("service `{0}` not found")]
    ServiceNotFound(String),

    #[error("validation error(s): {0}")]
    Validation(String),
}

/// Load the configuration from the first known file name inside `dir`.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the directory holds no config file, or
/// any error of [`load_from_path`].
pub fn load_from_dir(dir: &Path) -> Result<Config, ConfigError> {
    let path = DEFAULT_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    tracing::debug!("Loading config from {}", path.display());
    load_from_path(&path)
}

/// Load a configuration from a file path.
///
/// # Errors
///
/// Returns a `ConfigError` if the configuration file cannot be read or parsed.
pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    parse_auto(&text, path)
}

/// Parse a configuration, picking the format from the file extension.
///
/// # Errors
///
/// Returns a `ConfigError` if the configuration string cannot be parsed.
pub fn parse_auto(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => parse_yaml(text),
        #[cfg(feature = "toml")]
        "toml" => parse_toml(text),
        _ => Err(ConfigError::Validation("unknown config extension".into())),
    }
}

/// Parse a YAML configuration.
///
/// # Errors
///
/// Returns a `ConfigError` if the configuration string cannot be parsed.
#[cfg(feature = "yaml")]
pub fn parse_yaml(config: &str) -> Result<Config, ConfigError> {
    let raw = serde_yaml::from_str::<raw::RawConfig>(config)?;
    raw.try_into()
}

/// Parse a TOML configuration.
///
/// # Errors
///
/// Returns a `ConfigError` if the configuration string cannot be parsed.
#[cfg(feature = "toml")]
pub fn parse_toml(config: &str) -> Result<Config, ConfigError> {
    let raw = toml::from_str::<raw::RawConfig>(config)?;
    raw.try_into()
}
