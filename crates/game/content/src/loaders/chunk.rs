//! Chunk template loader.
//!
//! ```toml
//! [[chunk]]
//! name = "plaza"
//! weight = 1.0
//! size = [7, 5]
//! palettes = ["town"]
//! map = """
//! #######
//! #A@@..#
//! #@@@..#
//! #.....#
//! #######
//! """
//!
//! [[chunk.placements]]
//! chunks = ["fountain", "statue"]
//! id = "A"
//! ```

use std::path::Path;

use anyhow::Context;
use game_core::ChunkTemplate;
use serde::Deserialize;

use crate::loaders::{LoadResult, glyph, read_file};

#[derive(Debug, Deserialize)]
struct ChunkFile {
    #[serde(default)]
    chunk: Vec<ChunkToml>,
}

#[derive(Debug, Deserialize)]
struct ChunkToml {
    name: String,
    weight: f64,
    size: [i32; 2],
    #[serde(default)]
    palettes: Vec<String>,
    map: String,
    #[serde(default)]
    placements: Vec<PlacementToml>,
}

#[derive(Debug, Deserialize)]
struct PlacementToml {
    chunks: Vec<String>,
    id: String,
}

/// Loader for chunk template TOML files.
pub struct ChunkLoader;

impl ChunkLoader {
    /// Parses every `[[chunk]]` entry. Validation against palettes happens
    /// when the chunks are registered.
    pub fn parse(content: &str) -> LoadResult<Vec<ChunkTemplate>> {
        let file: ChunkFile = toml::from_str(content).context("Failed to parse chunk TOML")?;
        file.chunk
            .into_iter()
            .map(|toml| {
                let mut chunk =
                    ChunkTemplate::new(toml.name, toml.weight, (toml.size[0], toml.size[1]), &toml.map)
                        .with_palettes(toml.palettes);
                for placement in toml.placements {
                    let id = glyph(&placement.id, "placement")
                        .with_context(|| format!("in chunk '{}'", chunk.name))?;
                    chunk = chunk.with_placement(id, placement.chunks);
                }
                Ok(chunk)
            })
            .collect()
    }

    pub fn load(path: &Path) -> LoadResult<Vec<ChunkTemplate>> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAZA: &str = r#"
[[chunk]]
name = "plaza"
weight = 2.5
size = [5, 3]
palettes = ["town"]
map = """
#A@.#
#@@.#
#####
"""

[[chunk.placements]]
chunks = ["fountain"]
id = "A"

[[chunk]]
name = "fountain"
weight = 1.0
size = [2, 2]
palettes = ["town"]
map = """
~~
~~
"""
"#;

    #[test]
    fn parses_chunks_with_placements() {
        let chunks = ChunkLoader::parse(PLAZA).unwrap();
        assert_eq!(chunks.len(), 2);
        let plaza = &chunks[0];
        assert_eq!(plaza.name, "plaza");
        assert_eq!(plaza.size, (5, 3));
        assert_eq!((plaza.width(), plaza.height()), (5, 3));
        assert_eq!(plaza.placements[0].id, 'A');
        assert_eq!(plaza.placements[0].chunks, vec!["fountain".to_string()]);
        assert_eq!(plaza.glyph(1, 0), Some('A'));
    }

    #[test]
    fn missing_weight_is_an_error() {
        let err = ChunkLoader::parse("[[chunk]]\nname = \"x\"\nsize = [1, 1]\nmap = \".\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("weight"));
    }
}
