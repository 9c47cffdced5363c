//! Content loaders for reading game data from files.
//!
//! Each loader exposes `parse` over an in-memory string and `load` over a
//! path; [`ContentFactory`] ties them to the data directory layout.

pub mod chunk;
pub mod config;
pub mod factory;
pub mod palette;
pub mod raw;
pub mod sprite;

pub use chunk::ChunkLoader;
pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use palette::PaletteLoader;
pub use raw::RawLoader;
pub use sprite::SpriteSheetLoader;

use std::path::{Path, PathBuf};

use anyhow::Context;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file {}", path.display()))
}

/// Files in `dir` with the given extension, sorted by name.
///
/// A missing directory yields an empty list.
pub(crate) fn files_with_extension(dir: &Path, extension: &str) -> LoadResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Single-character map key, as used by palettes and placements.
pub(crate) fn glyph(key: &str, what: &str) -> LoadResult<char> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => anyhow::bail!("{what} key '{key}' must be exactly one character"),
    }
}
