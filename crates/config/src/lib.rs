use std::path::{Path, PathBuf};

use derive_more::From;
use foundation_hostlog::ForwarderConfig;
use serde::de::DeserializeOwned;

#[derive(Debug, From)]
pub enum ConfigError {
    #[from(ignore)]
    IOError(std::io::Error),

    #[from(ignore)]
    DeserializationFailed(toml::de::Error),

    InvalidPath(PathBuf),
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::DeserializationFailed(value)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

impl std::error::Error for ConfigError {}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// `forwarder_from_path` loads a [`ForwarderConfig`] from a TOML file.
///
/// Missing keys fall back to their defaults, unknown keys and invalid
/// console targets are rejected.
pub fn forwarder_from_path<V: Into<PathBuf>>(target: V) -> ConfigResult<ForwarderConfig> {
    from_path(target)
}

pub fn forwarder_from_str(content: &str) -> ConfigResult<ForwarderConfig> {
    Ok(toml::from_str(content)?)
}

/// `value_from_path` returns the regular `toml::Value` object instead of a
/// defined type.
pub fn value_from_path<V: Into<PathBuf>>(target: V) -> ConfigResult<toml::Value> {
    from_path(target)
}

pub fn from_path<T, V>(target: V) -> ConfigResult<T>
where
    T: DeserializeOwned,
    V: Into<PathBuf>,
{
    let target_path = target.into();
    if !is_file_path(&target_path) {
        return Err(ConfigError::InvalidPath(target_path));
    }
    let config_content = std::fs::read_to_string(target_path)?;
    let config_obj: T = toml::from_str(&config_content)?;
    Ok(config_obj)
}

fn is_file_path(path: &Path) -> bool {
    !path.as_os_str().is_empty() && !path.is_dir()
}
