use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod signals;
pub mod timing;

pub use signals::*;
pub use timing::*;

/// Configuration file picked up when no path is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "intersection.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IntersectionConfig {
    #[serde(default)]
    pub signals: SignalsConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub demand: DemandConfig,
    #[serde(default)]
    pub random: RandomConfig,
}

impl IntersectionConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        Self::from_toml_str(&content).with_context(|| format!("invalid configuration in {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: IntersectionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

impl Validate for IntersectionConfig {
    fn validate(&self) -> Result<()> {
        self.signals.validate()?;
        self.timing.validate()?;
        self.demand.validate()?;
        Ok(())
    }
}
