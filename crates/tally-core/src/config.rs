//! tally.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    pub executor: ExecutorConfig,
    pub task: TaskConfig,
    pub framework: FrameworkConfig,
}

/// The custom executor that wraps commands when a job asks for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub name: String,
    pub source: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            name: "tally agent executor".to_string(),
            source: "tally_scheduler_executor".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Name used for jobs submitted without one.
    pub default_job_name: String,
    /// Assigned ports are exported as `{prefix}0`, `{prefix}1`, ...
    pub port_env_prefix: String,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            default_job_name: "tallyjob".to_string(),
            port_env_prefix: "PORT".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    pub id: String,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            id: "tally-framework".to_string(),
        }
    }
}

impl TallyConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: TallyConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
