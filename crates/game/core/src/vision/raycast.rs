//! Bresenham line of sight with a bounded memo.

use std::collections::{HashMap, HashSet};

use crate::components::{BlockView, Dead, GridElement};
use crate::config::GameConfig;
use crate::ecs::World;
use crate::level::{Position, TileIdx};
use crate::sim::TileGrid;

/// Tiles on the Bresenham line from `from` to `to`, both ends included.
pub fn bresenham_line(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);

    let mut line = Vec::with_capacity((dx.max(-dy) + 1) as usize);
    loop {
        line.push(Position::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    line
}

/// Tiles that stop sight: `BlockView` entities that are not dead, plus
/// terrain that blocks view.
pub fn collect_blockers(world: &World, grid: &TileGrid) -> HashSet<Position> {
    let mut blockers: HashSet<Position> = world
        .query()
        .with::<GridElement>()
        .with::<BlockView>()
        .without::<Dead>()
        .entities()
        .into_iter()
        .filter_map(|entity| world.get::<GridElement>(entity).map(GridElement::position))
        .collect();
    for (i, tile) in grid.tiles.iter().enumerate() {
        if tile.block_view {
            blockers.insert(grid.level.coord(TileIdx(i)));
        }
    }
    blockers
}

/// Whether `to` can be seen from `from`.
///
/// Only intermediate tiles are tested, so a wall itself is visible.
/// Chebyshev neighbours are always visible.
pub fn line_of_sight(blockers: &HashSet<Position>, from: Position, to: Position) -> bool {
    if from.chebyshev(to) <= 1 {
        return true;
    }
    let line = bresenham_line(from, to);
    line[1..line.len() - 1]
        .iter()
        .all(|tile| !blockers.contains(tile))
}

/// Memo key: player and target pixel positions quantised to
/// [`GameConfig::RAY_CACHE_QUANTUM`].
pub type RayKey = (i32, i32, i32, i32);

pub fn ray_key(player_px: (i32, i32), target_px: (i32, i32)) -> RayKey {
    let q = GameConfig::RAY_CACHE_QUANTUM;
    (
        player_px.0.div_euclid(q),
        player_px.1.div_euclid(q),
        target_px.0.div_euclid(q),
        target_px.1.div_euclid(q),
    )
}

/// Raycast results keyed by quantised pixel positions.
///
/// Once [`GameConfig::RAY_CACHE_CAPACITY`] entries are stored, further
/// inserts are dropped.
#[derive(Debug, Default)]
pub struct RayCache {
    entries: HashMap<RayKey, bool>,
}

impl RayCache {
    pub fn get(&self, key: &RayKey) -> Option<bool> {
        self.entries.get(key).copied()
    }

    pub fn insert(&mut self, key: RayKey, visible: bool) -> bool {
        if self.entries.len() >= GameConfig::RAY_CACHE_CAPACITY && !self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, visible);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_includes_both_ends() {
        let line = bresenham_line(Position::new(0, 0), Position::new(4, 2));
        assert_eq!(line.first(), Some(&Position::new(0, 0)));
        assert_eq!(line.last(), Some(&Position::new(4, 2)));
        assert_eq!(line.len(), 5);

        let back = bresenham_line(Position::new(3, 3), Position::new(3, -1));
        assert_eq!(back.len(), 5);
        assert!(back.iter().all(|p| p.x == 3));
    }

    #[test]
    fn blocker_hides_tiles_behind_but_not_itself() {
        let blockers: HashSet<Position> = [Position::new(2, 0)].into_iter().collect();
        let origin = Position::new(0, 0);
        assert!(line_of_sight(&blockers, origin, Position::new(2, 0)));
        assert!(!line_of_sight(&blockers, origin, Position::new(3, 0)));
        assert!(line_of_sight(&blockers, Position::new(1, 0), Position::new(2, 0)));
    }

    #[test]
    fn cache_drops_inserts_when_full() {
        let mut cache = RayCache::default();
        for i in 0..GameConfig::RAY_CACHE_CAPACITY as i32 {
            assert!(cache.insert((0, 0, i, 0), true));
        }
        assert!(!cache.insert((1, 1, 1, 1), true));
        assert_eq!(cache.len(), GameConfig::RAY_CACHE_CAPACITY);
        assert_eq!(cache.get(&(1, 1, 1, 1)), None);
    }

    #[test]
    fn key_quantises_to_four_pixels() {
        assert_eq!(ray_key((33, 35), (64, 0)), ray_key((32, 32), (67, 3)));
        assert_ne!(ray_key((32, 32), (64, 0)), ray_key((36, 32), (64, 0)));
    }
}
