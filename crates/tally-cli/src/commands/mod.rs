pub mod compile;
pub mod pool;

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use tally_core::TallyConfig;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<TallyConfig> {
    match path {
        Some(p) => TallyConfig::from_file(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(TallyConfig::default()),
    }
}
