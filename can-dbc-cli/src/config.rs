//! Configuration loading and parsing

use anyhow::{anyhow, Context, Result};
use can_dbc_registry::{RegistryConfig, SourceId, SourceSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub dbc: Vec<DbcEntry>,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// One `[[dbc]]` table: a DBC file and the sources it applies to
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DbcEntry {
    pub sources: SourcesSpec,
    pub file: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SourcesSpec {
    Keyword(String), // "all"
    List(Vec<SourceId>),
}

impl SourcesSpec {
    pub fn to_source_set(&self) -> Result<SourceSet> {
        match self {
            SourcesSpec::Keyword(keyword) => keyword
                .parse()
                .with_context(|| format!("Invalid sources '{}'", keyword)),
            SourcesSpec::List(list) => Ok(list.iter().copied().collect()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

/// A DBC file to open, bound to a source set
#[derive(Debug, Clone, PartialEq)]
pub struct DbcBinding {
    pub sources: SourceSet,
    pub path: PathBuf,
}

impl DbcEntry {
    pub fn to_binding(&self) -> Result<DbcBinding> {
        Ok(DbcBinding {
            sources: self.sources.to_source_set()?,
            path: self.file.clone(),
        })
    }
}

/// Parse a `SOURCES=FILE` command line argument
pub fn parse_binding(arg: &str) -> std::result::Result<DbcBinding, String> {
    let (sources, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected SOURCES=FILE, got '{}'", arg))?;

    if path.is_empty() {
        return Err(format!("missing file in '{}'", arg));
    }

    Ok(DbcBinding {
        sources: sources.parse().map_err(|e| format!("{}", e))?,
        path: PathBuf::from(path),
    })
}

/// Load configuration from a TOML file
///
/// Relative DBC paths are taken relative to the config file's directory.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if let Some(base) = path.parent() {
        for entry in &mut config.dbc {
            if entry.file.is_relative() {
                entry.file = base.join(&entry.file);
            }
        }
    }

    for entry in &config.dbc {
        entry
            .sources
            .to_source_set()
            .map_err(|e| anyhow!("{:?}: {:#}", entry.file, e))?;
    }

    Ok(config)
}
