use super::{ChunkTemplate, Palette, PLACEHOLDER_FILL, TemplateError, TemplateRegistry, find_placeholder_region_by_id};
use crate::config::GameConfig;
use crate::level::Rect;
use crate::rng::GameRng;
use crate::weighted;

/// Terrain laid under props and NPCs drawn with their own glyph.
const DEFAULT_TERRAIN: &str = "floor";

/// One resolved map cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpandedCell {
    pub terrain: String,
    pub prop: Option<String>,
    pub npc: Option<String>,
}

impl ExpandedCell {
    pub fn terrain(name: impl Into<String>) -> Self {
        Self {
            terrain: name.into(),
            prop: None,
            npc: None,
        }
    }
}

/// A chunk with every placement substituted and every glyph resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpandedChunk {
    pub name: String,
    pub width: i32,
    pub height: i32,
    /// Row-major cells.
    pub cells: Vec<ExpandedCell>,
}

impl ExpandedChunk {
    pub fn cell(&self, x: i32, y: i32) -> Option<&ExpandedCell> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get((y * self.width + x) as usize)
    }

    /// Terrain names row by row, handy for assertions and debug dumps.
    pub fn terrain_rows(&self) -> Vec<Vec<&str>> {
        self.cells
            .chunks(self.width.max(1) as usize)
            .map(|row| row.iter().map(|c| c.terrain.as_str()).collect())
            .collect()
    }
}

/// Expands the chunk `name` with a fresh generator seeded from `seed`.
pub fn expand_with_placements(
    registry: &TemplateRegistry,
    name: &str,
    seed: u64,
) -> Result<ExpandedChunk, TemplateError> {
    let mut rng = GameRng::new(seed);
    expand_with_rng(registry, name, &mut rng)
}

/// Picks a weighted variant of `name` and expands it recursively.
pub fn expand_with_rng(
    registry: &TemplateRegistry,
    name: &str,
    rng: &mut GameRng,
) -> Result<ExpandedChunk, TemplateError> {
    let chunk = pick_variant(registry, &[name.to_string()], rng)?;
    let mut stack = Vec::new();
    Expander { registry, rng }.expand(chunk, 0, &mut stack)
}

fn pick_variant<'r>(
    registry: &'r TemplateRegistry,
    names: &[String],
    rng: &mut GameRng,
) -> Result<&'r ChunkTemplate, TemplateError> {
    let mut candidates: Vec<&ChunkTemplate> = Vec::new();
    for name in names {
        let variants = registry.variants(name);
        if variants.is_empty() {
            return Err(TemplateError::UnknownChunk(name.clone()));
        }
        candidates.extend(variants);
    }
    let index = weighted::choose_index(rng, &candidates)
        .ok_or_else(|| TemplateError::UnknownChunk(names.join(",")))?;
    Ok(candidates[index])
}

struct Expander<'a> {
    registry: &'a TemplateRegistry,
    rng: &'a mut GameRng,
}

impl Expander<'_> {
    /// `stack` holds the chunk names of the current recursion path only, so
    /// the same child may appear in sibling placements.
    fn expand(
        &mut self,
        chunk: &ChunkTemplate,
        depth: usize,
        stack: &mut Vec<String>,
    ) -> Result<ExpandedChunk, TemplateError> {
        if depth > GameConfig::MAX_TEMPLATE_DEPTH {
            return Err(TemplateError::DepthExceeded {
                chunk: chunk.name.clone(),
                limit: GameConfig::MAX_TEMPLATE_DEPTH,
            });
        }
        if stack.contains(&chunk.name) {
            let mut path = stack.clone();
            path.push(chunk.name.clone());
            return Err(TemplateError::Cycle { path });
        }
        stack.push(chunk.name.clone());
        let result = self.expand_frame(chunk, depth, stack);
        stack.pop();
        result
    }

    fn expand_frame(
        &mut self,
        chunk: &ChunkTemplate,
        depth: usize,
        stack: &mut Vec<String>,
    ) -> Result<ExpandedChunk, TemplateError> {
        let palette = self.registry.merged_palette(chunk)?;
        let (width, height) = (chunk.width(), chunk.height());
        let mut cells: Vec<Option<ExpandedCell>> = vec![None; (width * height) as usize];

        for placement in &chunk.placements {
            let slot = find_placeholder_region_by_id(&chunk.map, placement.id)?;
            let child = pick_variant(self.registry, &placement.chunks, self.rng)?;
            if child.size != (slot.w, slot.h) {
                return Err(TemplateError::SizeMismatch {
                    chunk: child.name.clone(),
                    id: placement.id,
                    expected: (slot.w, slot.h),
                    actual: child.size,
                });
            }
            let expanded = self.expand(child, depth + 1, stack)?;
            paste(&mut cells, width, slot, &expanded);
        }

        let mut resolved = Vec::with_capacity(cells.len());
        for (i, cell) in cells.into_iter().enumerate() {
            let (x, y) = (i as i32 % width, i as i32 / width);
            match cell {
                Some(cell) => resolved.push(cell),
                None => resolved.push(resolve_glyph(chunk, &palette, x, y)?),
            }
        }

        Ok(ExpandedChunk {
            name: chunk.name.clone(),
            width,
            height,
            cells: resolved,
        })
    }
}

fn paste(cells: &mut [Option<ExpandedCell>], width: i32, slot: Rect, child: &ExpandedChunk) {
    for (i, cell) in child.cells.iter().enumerate() {
        let x = slot.x + i as i32 % child.width;
        let y = slot.y + i as i32 / child.width;
        cells[(y * width + x) as usize] = Some(cell.clone());
    }
}

fn resolve_glyph(chunk: &ChunkTemplate, palette: &Palette, x: i32, y: i32) -> Result<ExpandedCell, TemplateError> {
    let glyph = chunk.glyph(x, y).unwrap_or(' ');
    let unresolved = || TemplateError::UnresolvedGlyph {
        chunk: chunk.name.clone(),
        glyph,
        x,
        y,
    };
    if glyph == PLACEHOLDER_FILL {
        return Err(unresolved());
    }
    if let Some(terrain) = palette.terrain.get(&glyph) {
        return Ok(ExpandedCell::terrain(terrain.clone()));
    }
    if let Some(prop) = palette.props.get(&glyph) {
        return Ok(ExpandedCell {
            prop: Some(prop.clone()),
            ..ExpandedCell::terrain(DEFAULT_TERRAIN)
        });
    }
    if let Some(npc) = palette.npcs.get(&glyph) {
        return Ok(ExpandedCell {
            npc: Some(npc.clone()),
            ..ExpandedCell::terrain(DEFAULT_TERRAIN)
        });
    }
    Err(unresolved())
}
