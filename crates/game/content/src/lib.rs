//! Data-driven content and its loaders.
//!
//! This crate turns the files under a data directory into the plain values
//! `game-core` consumes:
//! - palettes and chunk templates (TOML) → [`game_core::TemplateRegistry`]
//! - raw master records (TOML) → [`game_core::RawMaster`]
//! - sprite sheet frame lists (JSON) → [`game_core::raw::SpriteSheet`]
//! - tunables (`config.toml`) → [`game_core::GameConfig`]
//!
//! Every integrity rule is enforced at load time; a data directory that
//! loads is safe to plan and spawn from.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    ChunkLoader, ConfigLoader, ContentFactory, LoadResult, PaletteLoader, RawLoader, SpriteSheetLoader,
};

/// Data directory shipped with this crate.
pub fn bundled_data_dir() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}
