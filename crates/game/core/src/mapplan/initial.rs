//! Initial planners: base terrain for each floor style.

use std::sync::Arc;

use super::{EntitySpec, InitialMapPlanner, MetaPlan, PlanError, connectivity::distance_map};
use crate::level::{Position, Rect, Tile, TileIdx, TileKind};
use crate::template::{TemplateRegistry, expand_with_rng};

/// Picks non-overlapping rectangular rooms; terrain is left to meta planners.
#[derive(Clone, Copy, Debug)]
pub struct RoomsStarter {
    pub max_rooms: u32,
    pub min_size: i32,
    pub max_size: i32,
}

impl RoomsStarter {
    pub fn new(max_rooms: u32, min_size: i32, max_size: i32) -> Self {
        Self {
            max_rooms,
            min_size,
            max_size: max_size.max(min_size),
        }
    }
}

impl InitialMapPlanner for RoomsStarter {
    fn name(&self) -> &'static str {
        "rooms"
    }

    fn plan_initial(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        plan.fill(Tile::new(TileKind::Empty));
        let (width, height) = (plan.level.width, plan.level.height);
        for _ in 0..self.max_rooms {
            let w = plan.rng.range(self.min_size, self.max_size + 1);
            let h = plan.rng.range(self.min_size, self.max_size + 1);
            if w > width - 2 || h > height - 2 {
                continue;
            }
            let x = plan.rng.range(1, width - w);
            let y = plan.rng.range(1, height - h);
            let room = Rect::new(x, y, w, h);
            if plan.rooms.iter().all(|other| !room.intersects(other)) {
                plan.rooms.push(room);
            }
        }
        Ok(())
    }
}

/// One large chamber, plain, pillared or around a central pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct BigRoomStarter;

impl InitialMapPlanner for BigRoomStarter {
    fn name(&self) -> &'static str {
        "big_room"
    }

    fn plan_initial(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        plan.fill(Tile::wall());
        let room = Rect::new(1, 1, plan.level.width - 2, plan.level.height - 2);
        if room.w <= 0 || room.h <= 0 {
            return Ok(());
        }
        for position in room.positions() {
            plan.set_tile(position, Tile::floor());
        }

        match plan.rng.int_n(3) {
            1 => {
                for position in room.positions() {
                    let (dx, dy) = (position.x - room.x, position.y - room.y);
                    let inner = dx > 1 && dy > 1 && dx < room.w - 2 && dy < room.h - 2;
                    if inner && dx % 4 == 2 && dy % 4 == 2 {
                        plan.set_tile(position, Tile::wall());
                    }
                }
            }
            2 if room.w >= 8 && room.h >= 8 => {
                let pool = Rect::new(
                    room.x + room.w / 3,
                    room.y + room.h / 3,
                    room.w / 3,
                    room.h / 3,
                );
                for position in pool.positions() {
                    plan.set_tile(position, Tile::new(TileKind::Water));
                }
            }
            _ => {}
        }
        plan.rooms.push(room);
        Ok(())
    }
}

/// Turns every walkable tile outside the largest region into `fill`.
///
/// `passable` decides which tiles join regions; water counts for rivers that
/// bridges will cross later.
fn keep_largest_region(plan: &mut MetaPlan, passable: impl Fn(&Tile) -> bool, fill: Tile) {
    let level = plan.level;
    let mut region_of = vec![usize::MAX; plan.tiles.len()];
    let mut sizes = Vec::new();

    // Mark passable tiles walkable on a scratch copy so the BFS can reuse
    // the shared distance map.
    let scratch: Vec<Tile> = plan
        .tiles
        .iter()
        .map(|t| Tile {
            walkable: passable(t),
            ..*t
        })
        .collect();

    for i in 0..scratch.len() {
        if !scratch[i].walkable || region_of[i] != usize::MAX {
            continue;
        }
        let region = sizes.len();
        let distances = distance_map(&level, &scratch, &[level.coord(TileIdx(i))]);
        let mut size = 0usize;
        for (j, d) in distances.iter().enumerate() {
            if d.is_some() {
                region_of[j] = region;
                size += 1;
            }
        }
        sizes.push(size);
    }

    let Some(largest) = sizes
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        .map(|(region, _)| region)
    else {
        return;
    };
    for (i, tile) in plan.tiles.iter_mut().enumerate() {
        if region_of[i] != usize::MAX && region_of[i] != largest {
            *tile = fill;
        }
    }
}

/// Cellular-automaton caves.
#[derive(Clone, Copy, Debug)]
pub struct CaveStarter {
    pub wall_chance: f64,
    pub iterations: u32,
}

impl Default for CaveStarter {
    fn default() -> Self {
        Self {
            wall_chance: 0.45,
            iterations: 4,
        }
    }
}

impl CaveStarter {
    fn wall_neighbours(plan: &MetaPlan, position: Position) -> usize {
        let mut count = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if (dx, dy) == (0, 0) {
                    continue;
                }
                // Out of bounds reads as void, which blocks like a wall.
                if !plan.tile(position.offset(dx, dy)).walkable {
                    count += 1;
                }
            }
        }
        count
    }
}

impl InitialMapPlanner for CaveStarter {
    fn name(&self) -> &'static str {
        "cave"
    }

    fn plan_initial(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        let level = plan.level;
        for y in 0..level.height {
            for x in 0..level.width {
                let border = x == 0 || y == 0 || x == level.width - 1 || y == level.height - 1;
                let tile = if border || plan.rng.chance(self.wall_chance) {
                    Tile::wall()
                } else {
                    Tile::floor()
                };
                plan.set_tile(Position::new(x, y), tile);
            }
        }

        for _ in 0..self.iterations {
            let mut next = plan.tiles.clone();
            for y in 1..level.height - 1 {
                for x in 1..level.width - 1 {
                    let position = Position::new(x, y);
                    let walls = Self::wall_neighbours(plan, position);
                    let idx = level.index(x, y).0;
                    if walls >= 5 {
                        next[idx] = Tile::wall();
                    } else if walls <= 3 {
                        next[idx] = Tile::floor();
                    }
                }
            }
            plan.tiles = next;
        }

        keep_largest_region(plan, |t| t.walkable, Tile::wall());
        Ok(())
    }
}

/// Open dirt with scattered trees and, sometimes, a river.
#[derive(Clone, Copy, Debug)]
pub struct ForestStarter {
    pub tree_density: f64,
    pub river_chance: f64,
}

impl Default for ForestStarter {
    fn default() -> Self {
        Self {
            tree_density: 0.1,
            river_chance: 0.6,
        }
    }
}

impl InitialMapPlanner for ForestStarter {
    fn name(&self) -> &'static str {
        "forest"
    }

    fn plan_initial(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        let level = plan.level;
        for y in 0..level.height {
            for x in 0..level.width {
                let tile = if plan.rng.chance(self.tree_density) {
                    Tile::wall()
                } else {
                    Tile::new(TileKind::Dirt)
                };
                plan.set_tile(Position::new(x, y), tile);
            }
        }

        if level.height >= 9 && plan.rng.chance(self.river_chance) {
            let mut y = plan.rng.range(level.height / 3, 2 * level.height / 3);
            let thickness = plan.rng.range(2, 4);
            for x in 0..level.width {
                for t in 0..thickness {
                    plan.set_tile(Position::new(x, y + t), Tile::new(TileKind::Water));
                }
                y = (y + plan.rng.range(-1, 2)).clamp(2, level.height - thickness - 2);
            }
        }

        keep_largest_region(
            plan,
            |t| t.walkable || t.kind == TileKind::Water,
            Tile::wall(),
        );
        Ok(())
    }
}

/// Dirt field with broken-walled room outlines.
#[derive(Clone, Copy, Debug)]
pub struct RuinsStarter {
    pub max_rooms: u32,
}

impl RuinsStarter {
    /// Chance that a wall segment of an outline has crumbled away.
    const GAP_CHANCE: f64 = 0.25;

    pub fn new(max_rooms: u32) -> Self {
        Self { max_rooms }
    }
}

impl InitialMapPlanner for RuinsStarter {
    fn name(&self) -> &'static str {
        "ruins"
    }

    fn plan_initial(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        plan.fill(Tile::new(TileKind::Dirt));
        let (width, height) = (plan.level.width, plan.level.height);
        for _ in 0..self.max_rooms {
            let w = plan.rng.range(5, 11);
            let h = plan.rng.range(5, 11);
            if w > width - 4 || h > height - 4 {
                continue;
            }
            let room = Rect::new(plan.rng.range(2, width - w - 1), plan.rng.range(2, height - h - 1), w, h);
            if plan.rooms.iter().any(|other| room.intersects(other)) {
                continue;
            }
            for position in room.positions() {
                let edge = position.x == room.x
                    || position.y == room.y
                    || position.x == room.x2() - 1
                    || position.y == room.y2() - 1;
                let tile = if !edge {
                    Tile::floor()
                } else if plan.rng.chance(Self::GAP_CHANCE) {
                    Tile::new(TileKind::Dirt)
                } else {
                    Tile::wall()
                };
                plan.set_tile(position, tile);
            }
            plan.rooms.push(room);
        }
        Ok(())
    }
}

/// Lays an expanded chunk template over the level centre.
#[derive(Clone, Debug)]
pub struct TemplateStarter {
    templates: Arc<TemplateRegistry>,
    chunk: String,
    /// Terrain around a chunk smaller than the level.
    pub surround: TileKind,
}

impl TemplateStarter {
    pub fn new(templates: Arc<TemplateRegistry>, chunk: impl Into<String>) -> Self {
        Self {
            templates,
            chunk: chunk.into(),
            surround: TileKind::Dirt,
        }
    }
}

impl InitialMapPlanner for TemplateStarter {
    fn name(&self) -> &'static str {
        "template"
    }

    fn plan_initial(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        let expanded = expand_with_rng(&self.templates, &self.chunk, &mut plan.rng)?;
        let level = plan.level;
        if expanded.width > level.width || expanded.height > level.height {
            return Err(PlanError::TemplateTooLarge {
                chunk: expanded.name,
                size: (expanded.width, expanded.height),
                width: level.width,
                height: level.height,
            });
        }

        plan.fill(Tile::new(self.surround));
        let ox = (level.width - expanded.width) / 2;
        let oy = (level.height - expanded.height) / 2;
        for (i, cell) in expanded.cells.iter().enumerate() {
            let position = Position::new(ox + i as i32 % expanded.width, oy + i as i32 / expanded.width);
            let kind = plan
                .raw
                .tile_kind(&cell.terrain)
                .ok_or_else(|| PlanError::UnknownTerrain {
                    name: cell.terrain.clone(),
                })?;
            plan.set_tile(position, Tile::new(kind));
            if let Some(prop) = &cell.prop {
                plan.prop_specs.push(EntitySpec::new(prop.clone(), position));
            }
            if let Some(npc) = &cell.npc {
                plan.npc_specs.push(EntitySpec::new(npc.clone(), position));
            }
        }
        plan.rooms.push(Rect::new(ox, oy, expanded.width, expanded.height));
        Ok(())
    }
}
