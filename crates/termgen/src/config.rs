use clap::ValueEnum;
use longtail::resource::{OTHER_WORDS, WORD_FREQUENCY_SEED};
use longtail::TermOptions;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resources: ResourceConfig,
    #[serde(default)]
    pub generator: TermOptions,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default = "default_seed_table")]
    pub seed_table: String,
    #[serde(default = "default_reservoir")]
    pub reservoir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_count")]
    pub count: u64,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One term per line.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Config {
            resources: ResourceConfig::default(),
            generator: TermOptions::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            seed_table: default_seed_table(),
            reservoir: default_reservoir(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            format: OutputFormat::default(),
        }
    }
}

fn default_seed_table() -> String {
    WORD_FREQUENCY_SEED.to_string()
}
fn default_reservoir() -> String {
    OTHER_WORDS.to_string()
}
fn default_count() -> u64 {
    10_000
}
