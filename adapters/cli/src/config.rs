//! TOML configuration: tuning overrides plus extra levels.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use tower_defense_core::Tuning;
use tower_defense_world::levels::{LevelCatalog, LevelDefinition};

/// Contents of a `--config` file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GameConfig {
    pub(crate) tuning: Tuning,
    /// Drops the shipped levels so only `levels` are playable.
    pub(crate) replace_builtin_levels: bool,
    pub(crate) levels: Vec<LevelDefinition>,
}

impl GameConfig {
    /// Reads a configuration file, falling back to defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.tuning.validate()?;
        Ok(config)
    }

    /// Splits the configuration into the tuning tables and the level catalog.
    pub(crate) fn into_parts(self) -> Result<(Tuning, LevelCatalog)> {
        let mut catalog = if self.replace_builtin_levels {
            LevelCatalog::new()
        } else {
            LevelCatalog::builtin()
        };
        for level in self.levels {
            let id = level.id.clone();
            catalog
                .insert(level)
                .with_context(|| format!("level {id} is invalid"))?;
        }
        Ok((self.tuning, catalog))
    }
}
