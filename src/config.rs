//! Detector configuration (`check` / `channel` options), loadable from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::{CANDIDATES_CHANNEL, DETECTED_CHANNEL};

/// Which notification drives detection. Fixed once the behavior is attached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CheckValue", into = "CheckValue")]
pub enum CheckMode {
    /// Test the pairs published on this channel by a broad phase.
    Candidates(String),
    /// Test every pair of target bodies on each velocity integration step.
    EveryStep,
}

impl Default for CheckMode {
    fn default() -> Self {
        CheckMode::Candidates(CANDIDATES_CHANNEL.to_string())
    }
}

/// Raw TOML form of `check`: a channel name, or `true` for every step.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckValue {
    Flag(bool),
    Channel(String),
}

impl TryFrom<CheckValue> for CheckMode {
    type Error = ConfigError;

    fn try_from(value: CheckValue) -> Result<Self, Self::Error> {
        match value {
            CheckValue::Flag(true) => Ok(CheckMode::EveryStep),
            CheckValue::Flag(false) => Err(ConfigError::InvalidCheck(
                "`false` is not a channel; omit `check` to use the default".to_string(),
            )),
            CheckValue::Channel(name) if name.trim().is_empty() => {
                Err(ConfigError::InvalidCheck("empty channel name".to_string()))
            }
            CheckValue::Channel(name) => Ok(CheckMode::Candidates(name)),
        }
    }
}

impl From<CheckMode> for CheckValue {
    fn from(mode: CheckMode) -> Self {
        match mode {
            CheckMode::EveryStep => CheckValue::Flag(true),
            CheckMode::Candidates(name) => CheckValue::Channel(name),
        }
    }
}

/// Options recognized by [`crate::BodyCollisionDetection`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Channel to listen to for collision candidates, or `true` to check
    /// every pair of bodies on every step.
    pub check: CheckMode,
    /// Channel collision batches are published to.
    pub channel: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            check: CheckMode::default(),
            channel: DETECTED_CHANNEL.to_string(),
        }
    }
}

impl DetectorConfig {
    /// Convenience: all-pairs mode with the default output channel.
    pub fn every_step() -> Self {
        Self {
            check: CheckMode::EveryStep,
            ..Self::default()
        }
    }

    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(src)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel.trim().is_empty() {
            return Err(ConfigError::InvalidChannel(self.channel.clone()));
        }
        if let CheckMode::Candidates(name) = &self.check {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidCheck("empty channel name".to_string()));
            }
        }
        Ok(())
    }
}
