use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to open config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediatorConfig {
    #[serde(default = "default_publish_strategy")]
    pub publish_strategy: PublishStrategy,

    #[serde(default = "default_true")]
    pub log_dispatch: bool,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            publish_strategy: default_publish_strategy(),
            log_dispatch: default_true(),
        }
    }
}

/// What `publish` does when a notification handler fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PublishStrategy {
    /// Stop at the first failing handler and return its error.
    #[default]
    FailFast,
    /// Run every handler, then report all failures together.
    ContinueOnError,
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> ConfigResult<T> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> ConfigResult<T> {
    let config = serde_json::from_str(s)?;
    Ok(config)
}

fn default_publish_strategy() -> PublishStrategy {
    PublishStrategy::FailFast
}

fn default_true() -> bool {
    true
}
