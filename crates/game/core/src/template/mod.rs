//! ASCII chunk templates and their palettes.
//!
//! A chunk is a small map drawn with single characters. Palettes translate
//! characters into terrain, prop or NPC names; a chunk may list several
//! palettes, merged later-over-earlier. Placements embed other chunks into
//! `@`-filled placeholder regions, recursively (see [`expand`]).

mod expand;
mod placeholder;

pub use expand::{ExpandedCell, ExpandedChunk, expand_with_placements, expand_with_rng};
pub use placeholder::{PLACEHOLDER_FILL, find_placeholder_region_by_id};

use std::collections::{BTreeMap, HashMap};

use crate::error::{ErrorSeverity, GameError};
use crate::weighted::Weighted;

/// Character-to-name mappings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Palette {
    pub id: String,
    pub description: String,
    pub terrain: BTreeMap<char, String>,
    pub props: BTreeMap<char, String>,
    pub npcs: BTreeMap<char, String>,
}

impl Palette {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_terrain(mut self, glyph: char, name: impl Into<String>) -> Self {
        self.terrain.insert(glyph, name.into());
        self
    }

    pub fn with_prop(mut self, glyph: char, name: impl Into<String>) -> Self {
        self.props.insert(glyph, name.into());
        self
    }

    pub fn with_npc(mut self, glyph: char, name: impl Into<String>) -> Self {
        self.npcs.insert(glyph, name.into());
        self
    }

    /// Overlays `other` on top of `self`.
    pub fn merge(&mut self, other: &Palette) {
        self.terrain.extend(other.terrain.iter().map(|(k, v)| (*k, v.clone())));
        self.props.extend(other.props.iter().map(|(k, v)| (*k, v.clone())));
        self.npcs.extend(other.npcs.iter().map(|(k, v)| (*k, v.clone())));
    }
}

/// A nested chunk slot: one of `chunks` fills the region marked `id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub chunks: Vec<String>,
    pub id: char,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChunkTemplate {
    pub name: String,
    pub weight: f64,
    /// Declared `[W, H]`.
    pub size: (i32, i32),
    pub palettes: Vec<String>,
    /// Map rows.
    pub map: Vec<Vec<char>>,
    pub placements: Vec<Placement>,
}

impl ChunkTemplate {
    /// Builds a chunk from a multi-line map literal.
    ///
    /// A single leading newline and trailing empty lines are ignored, which
    /// matches how TOML multi-line strings are usually written.
    pub fn new(name: impl Into<String>, weight: f64, size: (i32, i32), map: &str) -> Self {
        Self {
            name: name.into(),
            weight,
            size,
            palettes: Vec::new(),
            map: parse_map(map),
            placements: Vec::new(),
        }
    }

    pub fn with_palettes<I, S>(mut self, palettes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.palettes = palettes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_placement<I, S>(mut self, id: char, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.placements.push(Placement {
            chunks: chunks.into_iter().map(Into::into).collect(),
            id,
        });
        self
    }

    pub fn width(&self) -> i32 {
        self.map.first().map_or(0, |row| row.len() as i32)
    }

    pub fn height(&self) -> i32 {
        self.map.len() as i32
    }

    pub fn glyph(&self, x: i32, y: i32) -> Option<char> {
        let row = self.map.get(usize::try_from(y).ok()?)?;
        row.get(usize::try_from(x).ok()?).copied()
    }

    /// Checks the template against the registered palettes.
    pub fn validate(&self, palettes: &HashMap<String, Palette>) -> Result<(), TemplateError> {
        if self.name.trim().is_empty() {
            return Err(TemplateError::EmptyName);
        }
        if !(self.weight > 0.0) {
            return Err(TemplateError::InvalidWeight {
                chunk: self.name.clone(),
                weight: self.weight.to_string(),
            });
        }
        let width = self.width();
        if let Some(row) = self.map.iter().position(|r| r.len() as i32 != width) {
            return Err(TemplateError::RaggedRows {
                chunk: self.name.clone(),
                row,
            });
        }
        if self.size != (width, self.height()) {
            return Err(TemplateError::DeclaredSizeMismatch {
                chunk: self.name.clone(),
                declared: self.size,
                actual: (width, self.height()),
            });
        }
        if let Some(missing) = self.palettes.iter().find(|p| !palettes.contains_key(*p)) {
            return Err(TemplateError::UnknownPalette {
                chunk: self.name.clone(),
                palette: missing.clone(),
            });
        }
        if let Some(bad) = self.placements.iter().find(|p| !p.id.is_ascii_uppercase()) {
            return Err(TemplateError::InvalidPlaceholderId {
                chunk: self.name.clone(),
                id: bad.id,
            });
        }
        Ok(())
    }
}

impl Weighted for ChunkTemplate {
    fn weight(&self) -> f64 {
        self.weight
    }
}

fn parse_map(map: &str) -> Vec<Vec<char>> {
    let map = map.strip_prefix('\n').unwrap_or(map);
    let mut rows: Vec<Vec<char>> = map
        .lines()
        .map(|line| line.trim_end_matches('\r').chars().collect())
        .collect();
    while rows.last().is_some_and(|row| row.is_empty()) {
        rows.pop();
    }
    rows
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("chunk name must not be empty")]
    EmptyName,

    #[error("chunk '{chunk}' has non-positive weight {weight}")]
    InvalidWeight { chunk: String, weight: String },

    #[error("chunk '{chunk}' row {row} length differs from the first row")]
    RaggedRows { chunk: String, row: usize },

    #[error("chunk '{chunk}' declares size {declared:?} but its map is {actual:?}")]
    DeclaredSizeMismatch {
        chunk: String,
        declared: (i32, i32),
        actual: (i32, i32),
    },

    #[error("chunk '{chunk}' references unknown palette '{palette}'")]
    UnknownPalette { chunk: String, palette: String },

    #[error("chunk '{chunk}' has invalid placeholder id '{id}'")]
    InvalidPlaceholderId { chunk: String, id: char },

    #[error("unknown chunk '{0}'")]
    UnknownChunk(String),

    #[error("placeholder '{id}' not found")]
    PlaceholderNotFound { id: char },

    #[error("placeholder '{id}' appears more than once")]
    DuplicatePlaceholder { id: char },

    #[error("placeholder '{id}' is not a solid rectangle of '@' with the id in a corner")]
    MalformedPlaceholder { id: char },

    #[error("サイズが不一致: chunk '{chunk}' is {actual:?}, placeholder '{id}' is {expected:?}")]
    SizeMismatch {
        chunk: String,
        id: char,
        expected: (i32, i32),
        actual: (i32, i32),
    },

    #[error("template nesting deeper than {limit} at chunk '{chunk}'")]
    DepthExceeded { chunk: String, limit: usize },

    #[error("template cycle: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("chunk '{chunk}' has unresolved glyph '{glyph}' at ({x}, {y})")]
    UnresolvedGlyph {
        chunk: String,
        glyph: char,
        x: i32,
        y: i32,
    },
}

impl GameError for TemplateError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Integrity
    }

    fn error_code(&self) -> &'static str {
        match self {
            TemplateError::EmptyName => "TEMPLATE_EMPTY_NAME",
            TemplateError::InvalidWeight { .. } => "TEMPLATE_INVALID_WEIGHT",
            TemplateError::RaggedRows { .. } => "TEMPLATE_RAGGED_ROWS",
            TemplateError::DeclaredSizeMismatch { .. } => "TEMPLATE_DECLARED_SIZE",
            TemplateError::UnknownPalette { .. } => "TEMPLATE_UNKNOWN_PALETTE",
            TemplateError::InvalidPlaceholderId { .. } => "TEMPLATE_INVALID_ID",
            TemplateError::UnknownChunk(_) => "TEMPLATE_UNKNOWN_CHUNK",
            TemplateError::PlaceholderNotFound { .. } => "TEMPLATE_PLACEHOLDER_NOT_FOUND",
            TemplateError::DuplicatePlaceholder { .. } => "TEMPLATE_DUPLICATE_PLACEHOLDER",
            TemplateError::MalformedPlaceholder { .. } => "TEMPLATE_MALFORMED_PLACEHOLDER",
            TemplateError::SizeMismatch { .. } => "TEMPLATE_SIZE_MISMATCH",
            TemplateError::DepthExceeded { .. } => "TEMPLATE_DEPTH_EXCEEDED",
            TemplateError::Cycle { .. } => "TEMPLATE_CYCLE",
            TemplateError::UnresolvedGlyph { .. } => "TEMPLATE_UNRESOLVED_GLYPH",
        }
    }
}

/// Palettes and chunk variants by name.
#[derive(Clone, Debug, Default)]
pub struct TemplateRegistry {
    palettes: HashMap<String, Palette>,
    chunks: HashMap<String, Vec<ChunkTemplate>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a palette, merging over an existing one with the same id.
    pub fn add_palette(&mut self, palette: Palette) {
        match self.palettes.get_mut(&palette.id) {
            Some(existing) => existing.merge(&palette),
            None => {
                self.palettes.insert(palette.id.clone(), palette);
            }
        }
    }

    /// Registers a chunk variant after validating it.
    ///
    /// Palettes must be registered first.
    pub fn add_chunk(&mut self, chunk: ChunkTemplate) -> Result<(), TemplateError> {
        chunk.validate(&self.palettes)?;
        self.chunks.entry(chunk.name.clone()).or_default().push(chunk);
        Ok(())
    }

    pub fn palette(&self, id: &str) -> Option<&Palette> {
        self.palettes.get(id)
    }

    /// Every variant registered under `name`.
    pub fn variants(&self, name: &str) -> &[ChunkTemplate] {
        self.chunks.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_chunk(&self, name: &str) -> bool {
        self.chunks.contains_key(name)
    }

    pub fn chunk_names(&self) -> impl Iterator<Item = &str> {
        self.chunks.keys().map(String::as_str)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.values().map(Vec::len).sum()
    }

    /// Palettes of `chunk` merged later-over-earlier.
    pub fn merged_palette(&self, chunk: &ChunkTemplate) -> Result<Palette, TemplateError> {
        let mut merged = Palette::new(chunk.name.clone());
        for id in &chunk.palettes {
            let palette = self
                .palettes
                .get(id)
                .ok_or_else(|| TemplateError::UnknownPalette {
                    chunk: chunk.name.clone(),
                    palette: id.clone(),
                })?;
            merged.merge(palette);
        }
        Ok(merged)
    }

    /// Checks that every placement names registered chunks.
    pub fn validate_references(&self) -> Result<(), TemplateError> {
        for variants in self.chunks.values() {
            for chunk in variants {
                for placement in &chunk.placements {
                    if let Some(missing) = placement.chunks.iter().find(|n| !self.contains_chunk(n)) {
                        return Err(TemplateError::UnknownChunk(missing.clone()));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        registry.add_palette(Palette::new("base").with_terrain('.', "floor").with_terrain('#', "wall"));
        registry
    }

    #[test]
    fn later_palettes_override_earlier() {
        let mut registry = registry();
        registry.add_palette(Palette::new("dirt").with_terrain('.', "dirt"));
        let chunk = ChunkTemplate::new("c", 1.0, (1, 1), ".").with_palettes(["base", "dirt"]);
        let merged = registry.merged_palette(&chunk).unwrap();
        assert_eq!(merged.terrain[&'.'], "dirt");
        assert_eq!(merged.terrain[&'#'], "wall");
    }

    #[test]
    fn validation_rules() {
        let mut registry = registry();
        let ok = ChunkTemplate::new("room", 1.0, (3, 2), "\n###\n#.#\n").with_palettes(["base"]);
        assert_eq!(ok.height(), 2);
        registry.add_chunk(ok).unwrap();

        let ragged = ChunkTemplate::new("ragged", 1.0, (3, 2), "###\n#.").with_palettes(["base"]);
        assert!(matches!(registry.add_chunk(ragged), Err(TemplateError::RaggedRows { row: 1, .. })));

        let wrong = ChunkTemplate::new("wrong", 1.0, (4, 2), "###\n#.#").with_palettes(["base"]);
        assert!(matches!(
            registry.add_chunk(wrong),
            Err(TemplateError::DeclaredSizeMismatch { .. })
        ));

        let heavy = ChunkTemplate::new("zero", 0.0, (1, 1), ".").with_palettes(["base"]);
        assert!(matches!(registry.add_chunk(heavy), Err(TemplateError::InvalidWeight { .. })));

        let nameless = ChunkTemplate::new(" ", 1.0, (1, 1), ".");
        assert_eq!(registry.add_chunk(nameless), Err(TemplateError::EmptyName));

        let orphan = ChunkTemplate::new("orphan", 1.0, (1, 1), ".").with_palettes(["nope"]);
        assert!(matches!(
            registry.add_chunk(orphan),
            Err(TemplateError::UnknownPalette { .. })
        ));
        assert_eq!(registry.chunk_count(), 1);
    }
}
