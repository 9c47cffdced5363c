//! Game configuration loader.

use std::path::Path;

use anyhow::Context;
use game_core::GameConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for game configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Parses a config document. Missing keys keep their defaults.
    pub fn parse(content: &str) -> LoadResult<GameConfig> {
        let config: GameConfig = toml::from_str(content).context("Failed to parse config TOML")?;
        if config.map_width < 8 || config.map_height < 8 {
            anyhow::bail!(
                "map size {}x{} is below the 8x8 minimum",
                config.map_width,
                config.map_height
            );
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> LoadResult<GameConfig> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }
}
