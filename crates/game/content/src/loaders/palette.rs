//! Palette loader.
//!
//! ```toml
//! [palette]
//! id = "dungeon"
//! description = "stone interiors"
//!
//! [palette.terrain]
//! "#" = "wall"
//! "." = "floor"
//!
//! [palette.furniture]
//! "+" = "door"
//!
//! [palette.npcs]
//! "r" = "rat"
//! ```
//!
//! `[palette.props]` is accepted in place of `[palette.furniture]`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use game_core::Palette;
use serde::Deserialize;

use crate::loaders::{LoadResult, glyph, read_file};

#[derive(Debug, Deserialize)]
struct PaletteFile {
    palette: PaletteToml,
}

#[derive(Debug, Deserialize)]
struct PaletteToml {
    id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    terrain: BTreeMap<String, String>,
    #[serde(default, alias = "props")]
    furniture: BTreeMap<String, String>,
    #[serde(default)]
    npcs: BTreeMap<String, String>,
}

fn glyph_map(entries: BTreeMap<String, String>, what: &str) -> LoadResult<BTreeMap<char, String>> {
    entries
        .into_iter()
        .map(|(key, name)| Ok((glyph(&key, what)?, name)))
        .collect()
}

/// Loader for palette TOML files.
pub struct PaletteLoader;

impl PaletteLoader {
    pub fn parse(content: &str) -> LoadResult<Palette> {
        let file: PaletteFile = toml::from_str(content).context("Failed to parse palette TOML")?;
        let toml = file.palette;
        if toml.id.trim().is_empty() {
            anyhow::bail!("palette id must not be empty");
        }
        Ok(Palette {
            terrain: glyph_map(toml.terrain, "terrain")?,
            props: glyph_map(toml.furniture, "furniture")?,
            npcs: glyph_map(toml.npcs, "npc")?,
            id: toml.id,
            description: toml.description,
        })
    }

    pub fn load(path: &Path) -> LoadResult<Palette> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }
}
