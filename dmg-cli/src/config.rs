use anyhow::Context;
use dmg_core::InterruptDispatch;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings that can live in a TOML file. Command-line flags take precedence over these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub debugger_enabled: bool,

    #[serde(default)]
    pub frame_limit: Option<u64>,

    #[serde(default)]
    pub interrupt_dispatch: InterruptDispatch,

    /// Directory to write every presented frame into, as binary PPM images.
    #[serde(default)]
    pub frame_dump_dir: Option<PathBuf>,
}

impl CliConfig {
    pub fn from_toml_file<P>(path: P) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path> + std::fmt::Debug,
    {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("error reading TOML config file from {path:?}"))?;
        let config: Self = toml::from_str(&config_str)
            .with_context(|| format!("error parsing config from TOML file at {path:?}"))?;

        Ok(config)
    }

    pub fn save_to_file<P>(&self, path: P) -> Result<(), anyhow::Error>
    where
        P: AsRef<Path> + std::fmt::Debug,
    {
        let config_str =
            toml::to_string_pretty(self).context("error serializing config into TOML")?;
        fs::write(path.as_ref(), config_str)
            .with_context(|| format!("error writing config to {path:?}"))?;

        Ok(())
    }
}
