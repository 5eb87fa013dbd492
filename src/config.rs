use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use facemorph_warp::{EffectOptions, NoiseSeed};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| {
    option_env!("FACEMORPH_CONFIG_PATH")
        .map(PathBuf::from)
        .or_else(|| {
            ProjectDirs::from("", "", "facemorph").map(|dirs| dirs.config_dir().join("config.toml"))
        })
        .unwrap_or_else(|| PathBuf::from("facemorph.toml"))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    Sequential,
    #[default]
    Parallel,
    Worker,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EffectConfig {
    #[serde(flatten)]
    pub options: EffectOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub executor: ExecutorKind,
    /// Row worker threads; 0 uses the rayon default.
    pub threads: usize,
    pub sliders: BTreeMap<String, i32>,
    pub effect: EffectConfig,
    pub presets: BTreeMap<String, BTreeMap<String, i32>>,
}

impl Config {
    pub fn noise_seed(&self) -> NoiseSeed {
        self.seed.map(NoiseSeed::Fixed).unwrap_or_default()
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}
