use std::path::Path;

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    error::ConfigError,
    params::Params,
};

/// Node-side configuration for the IBC admission stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnteConfig {
    /// Redundant-relay filter configuration.
    #[serde(default)]
    pub redundancy_filter: RedundancyFilterConfig,
    /// Genesis controller params. Not consulted by the ante stages.
    #[serde(default)]
    pub controller: Params,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedundancyFilterConfig {
    /// Enable/disable the filter entirely.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl Default for RedundancyFilterConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

impl AnteConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Loads a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
