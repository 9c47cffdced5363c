//! Content factory for building core resources from a data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use game_core::mapplan::PlanResources;
use game_core::raw::{RawData, SpriteSheet};
use game_core::{GameConfig, RawMaster, TemplateRegistry};

use crate::loaders::{
    ChunkLoader, ConfigLoader, LoadResult, PaletteLoader, RawLoader, SpriteSheetLoader, files_with_extension,
};

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── palettes/*.toml
/// ├── chunks/*.toml
/// ├── raws/*.toml
/// └── sprites/*.json
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load game configuration from `config.toml`, or defaults when absent.
    pub fn load_config(&self) -> LoadResult<GameConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config.toml; using defaults");
            return Ok(GameConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load every palette, then every chunk, and check cross-references.
    pub fn load_templates(&self) -> LoadResult<TemplateRegistry> {
        let mut registry = TemplateRegistry::new();
        for path in files_with_extension(&self.data_dir.join("palettes"), "toml")? {
            registry.add_palette(PaletteLoader::load(&path)?);
        }
        for path in files_with_extension(&self.data_dir.join("chunks"), "toml")? {
            for chunk in ChunkLoader::load(&path)? {
                let name = chunk.name.clone();
                registry
                    .add_chunk(chunk)
                    .with_context(|| format!("invalid chunk '{name}' in {}", path.display()))?;
            }
        }
        registry
            .validate_references()
            .context("chunk placement references an unknown chunk")?;
        tracing::debug!(chunks = registry.chunk_count(), "templates loaded");
        Ok(registry)
    }

    /// Load every sprite sheet under `sprites/`.
    pub fn load_sprite_sheets(&self) -> LoadResult<Vec<SpriteSheet>> {
        files_with_extension(&self.data_dir.join("sprites"), "json")?
            .iter()
            .map(|path| SpriteSheetLoader::load(path))
            .collect()
    }

    /// Load and validate the raw master from `raws/` and `sprites/`.
    pub fn load_raws(&self) -> LoadResult<RawMaster> {
        let mut data = RawData::default();
        for path in files_with_extension(&self.data_dir.join("raws"), "toml")? {
            RawLoader::merge(&mut data, RawLoader::load(&path)?);
        }
        RawLoader::build(data, self.load_sprite_sheets()?)
    }

    /// Everything the map pipeline needs.
    ///
    /// Template terrain and entity names are checked against the raw master
    /// here, so a missing raw fails at load instead of mid-game.
    pub fn load_resources(&self) -> LoadResult<PlanResources> {
        let raw = self.load_raws()?;
        let templates = self.load_templates()?;
        check_template_names(&templates, &raw)?;
        Ok(PlanResources::new(Arc::new(raw), Arc::new(templates)))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn check_template_names(templates: &TemplateRegistry, raw: &RawMaster) -> LoadResult<()> {
    let mut palette_ids: Vec<&str> = Vec::new();
    for name in templates.chunk_names() {
        for chunk in templates.variants(name) {
            palette_ids.extend(chunk.palettes.iter().map(String::as_str));
        }
    }
    palette_ids.sort_unstable();
    palette_ids.dedup();

    for id in palette_ids {
        let Some(palette) = templates.palette(id) else {
            continue;
        };
        if let Some(name) = palette.terrain.values().find(|name| raw.tile_kind(name).is_none()) {
            anyhow::bail!("palette '{id}' uses unknown terrain '{name}'");
        }
        if let Some(name) = palette.props.values().find(|name| !raw.has_prop(name)) {
            anyhow::bail!("palette '{id}' uses unknown prop '{name}'");
        }
        if let Some(name) = palette.npcs.values().find(|name| !raw.has_member(name)) {
            anyhow::bail!("palette '{id}' uses unknown npc '{name}'");
        }
    }
    Ok(())
}
