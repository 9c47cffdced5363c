//! Sprite sheet loader.
//!
//! Sheets are the JSON frame lists exported by texture packers:
//! `{"frames": {"key": {"frame": {...}}, ...}}`. Only the keys matter here;
//! the sheet is named after the file stem.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use game_core::raw::SpriteSheet;
use serde::Deserialize;

use crate::loaders::{LoadResult, read_file};

#[derive(Debug, Deserialize)]
struct SheetJson {
    frames: BTreeMap<String, serde_json::Value>,
}

/// Loader for sprite sheet JSON files.
pub struct SpriteSheetLoader;

impl SpriteSheetLoader {
    pub fn parse(name: &str, content: &str) -> LoadResult<SpriteSheet> {
        let sheet: SheetJson = serde_json::from_str(content).context("Failed to parse sprite sheet JSON")?;
        Ok(SpriteSheet::new(name, sheet.frames.into_keys()))
    }

    pub fn load(path: &Path) -> LoadResult<SpriteSheet> {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .with_context(|| format!("sprite sheet path {} has no usable name", path.display()))?;
        let content = read_file(path)?;
        Self::parse(name, &content).with_context(|| format!("in {}", path.display()))
    }
}
