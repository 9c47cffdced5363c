//! Field of view, lighting and explored-tile memory.
//!
//! [`VisionState::update`] rebuilds the per-tile visibility map around the
//! player. The result is cached against the player's pixel position and only
//! recomputed after a move of at least one tile or when a force update was
//! requested (doors opening or closing). Raycasts are additionally memoised
//! by quantised pixel coordinates across recomputations.

mod light;
mod raycast;

pub use light::{LightInfo, MAX_DISTANCE_DARKNESS, PlacedLight, collect_lights, distance_darkness, light_at};
pub use raycast::{RayCache, RayKey, bresenham_line, collect_blockers, line_of_sight, ray_key};

use std::collections::{HashMap, HashSet};

use crate::components::{Dead, GridElement, player_entity};
use crate::config::GameConfig;
use crate::ecs::World;
use crate::level::Position;
use crate::sim::TileGrid;

/// Visibility of one tile for the current player position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileVisibility {
    pub visible: bool,
    /// Euclidean distance from the player in tiles.
    pub distance: f64,
    pub darkness: f64,
}

/// Pixel coordinates of a tile's origin.
pub fn tile_to_pixel(position: Position) -> (i32, i32) {
    (
        position.x * GameConfig::TILE_SIZE,
        position.y * GameConfig::TILE_SIZE,
    )
}

fn pixel_to_tile(px: (i32, i32)) -> Position {
    Position::new(
        px.0.div_euclid(GameConfig::TILE_SIZE),
        px.1.div_euclid(GameConfig::TILE_SIZE),
    )
}

#[derive(Debug)]
pub struct VisionState {
    radius: i32,
    /// Player pixel position of the last recomputation.
    cached_at: Option<(i32, i32)>,
    visibility: HashMap<Position, TileVisibility>,
    lights: HashMap<Position, LightInfo>,
    explored: HashSet<Position>,
    rays: RayCache,
    needs_force_update: bool,
    recomputations: u64,
}

impl VisionState {
    pub fn new(radius: i32) -> Self {
        Self {
            radius: radius.max(1),
            cached_at: None,
            visibility: HashMap::new(),
            lights: HashMap::new(),
            explored: HashSet::new(),
            rays: RayCache::default(),
            needs_force_update: false,
            recomputations: 0,
        }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Requests a recomputation on the next update regardless of movement.
    pub fn request_force_update(&mut self) {
        self.needs_force_update = true;
    }

    pub fn needs_force_update(&self) -> bool {
        self.needs_force_update
    }

    /// Whether an update at `player_px` would recompute.
    pub fn is_stale(&self, player_px: (i32, i32)) -> bool {
        if self.needs_force_update {
            return true;
        }
        match self.cached_at {
            None => true,
            Some((x, y)) => {
                (player_px.0 - x).abs() >= GameConfig::TILE_SIZE
                    || (player_px.1 - y).abs() >= GameConfig::TILE_SIZE
            }
        }
    }

    /// Recomputes visibility for the live player, if any.
    pub fn update_for_player(&mut self, world: &World, grid: &TileGrid) -> bool {
        let player = player_entity(world).filter(|&p| !world.has::<Dead>(p));
        match player.and_then(|p| world.get::<GridElement>(p)) {
            Some(grid_pos) => self.update(world, grid, tile_to_pixel(grid_pos.position())),
            None => false,
        }
    }

    /// Rebuilds the visibility map around `player_px` when stale.
    ///
    /// Returns whether a recomputation happened.
    pub fn update(&mut self, world: &World, grid: &TileGrid, player_px: (i32, i32)) -> bool {
        if !self.is_stale(player_px) {
            return false;
        }
        if self.needs_force_update {
            // Blockers changed; memoised rays are no longer valid.
            self.rays.clear();
            self.needs_force_update = false;
        }

        let origin = pixel_to_tile(player_px);
        let blockers = collect_blockers(world, grid);
        let placed_lights = collect_lights(world);
        let radius = f64::from(self.radius);

        self.visibility.clear();
        self.lights.clear();

        for dy in -self.radius..=self.radius {
            for dx in -self.radius..=self.radius {
                let target = origin.offset(dx, dy);
                if !grid.contains(target) {
                    continue;
                }
                let distance = origin.euclidean(target);
                if distance > radius {
                    continue;
                }

                let visible = if origin.chebyshev(target) <= 1 {
                    true
                } else {
                    let key = ray_key(player_px, tile_to_pixel(target));
                    match self.rays.get(&key) {
                        Some(hit) => hit,
                        None => {
                            let hit = line_of_sight(&blockers, origin, target);
                            self.rays.insert(key, hit);
                            hit
                        }
                    }
                };
                let darkness = if visible {
                    distance_darkness(distance, radius)
                } else {
                    1.0
                };
                self.visibility.insert(
                    target,
                    TileVisibility {
                        visible,
                        distance,
                        darkness,
                    },
                );

                let light = light_at(target, &placed_lights);
                if visible && light.is_lit() {
                    self.explored.insert(target);
                }
                self.lights.insert(target, light);
            }
        }

        self.cached_at = Some(player_px);
        self.recomputations += 1;
        tracing::trace!(
            x = origin.x,
            y = origin.y,
            tiles = self.visibility.len(),
            explored = self.explored.len(),
            "visibility recomputed"
        );
        true
    }

    pub fn tile(&self, position: Position) -> Option<&TileVisibility> {
        self.visibility.get(&position)
    }

    pub fn is_visible(&self, position: Position) -> bool {
        self.visibility.get(&position).is_some_and(|v| v.visible)
    }

    pub fn visibility(&self) -> &HashMap<Position, TileVisibility> {
        &self.visibility
    }

    /// Light on a tile; unlit outside the last computed area.
    pub fn light(&self, position: Position) -> LightInfo {
        self.lights
            .get(&position)
            .copied()
            .unwrap_or(LightInfo::UNLIT)
    }

    pub fn explored(&self) -> &HashSet<Position> {
        &self.explored
    }

    pub fn is_explored(&self, position: Position) -> bool {
        self.explored.contains(&position)
    }

    pub fn ray_cache_len(&self) -> usize {
        self.rays.len()
    }

    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    /// Empties every cache, the explored set and the position cache.
    pub fn clear_vision_caches(&mut self) {
        self.cached_at = None;
        self.visibility.clear();
        self.lights.clear();
        self.explored.clear();
        self.rays.clear();
        self.needs_force_update = false;
    }
}

impl Default for VisionState {
    fn default() -> Self {
        Self::new(GameConfig::DEFAULT_VISION_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BlockView, LightSource, Player, Rgba};
    use crate::level::{Level, Tile};

    fn room() -> (World, TileGrid) {
        let mut world = World::new();
        let player = world.spawn();
        world.insert(player, Player);
        world.insert(player, GridElement::new(5, 5));
        (world, TileGrid::filled(Level::new(20, 20), Tile::floor()))
    }

    #[test]
    fn cache_holds_until_player_moves_a_tile() {
        let (world, grid) = room();
        let mut vision = VisionState::new(8);
        assert!(vision.update(&world, &grid, (160, 160)));
        assert!(!vision.update(&world, &grid, (170, 150)));
        assert!(vision.update(&world, &grid, (192, 160)));
        assert_eq!(vision.recomputations(), 2);

        vision.request_force_update();
        assert!(vision.update(&world, &grid, (192, 160)));
        assert!(!vision.needs_force_update());
    }

    #[test]
    fn neighbours_are_visible_even_behind_blockers() {
        let (mut world, grid) = room();
        for (x, y) in [(4, 4), (5, 4), (6, 4), (4, 5), (6, 5), (4, 6), (5, 6), (6, 6)] {
            let wall = world.spawn();
            world.insert(wall, GridElement::new(x, y));
            world.insert(wall, BlockView);
        }
        let mut vision = VisionState::new(8);
        vision.update_for_player(&world, &grid);
        assert!(vision.is_visible(Position::new(6, 6)));
        assert!(!vision.is_visible(Position::new(8, 5)));
        assert_eq!(vision.tile(Position::new(8, 5)).unwrap().darkness, 1.0);
    }

    #[test]
    fn explored_requires_light() {
        let (mut world, grid) = room();
        let mut vision = VisionState::new(8);
        vision.update_for_player(&world, &grid);
        assert!(vision.explored().is_empty());

        let torch = world.spawn();
        world.insert(torch, GridElement::new(5, 5));
        world.insert(torch, LightSource::new(3, Rgba::new(255, 200, 120, 255)));
        vision.request_force_update();
        vision.update_for_player(&world, &grid);
        assert!(vision.is_explored(Position::new(7, 5)));
        assert!(!vision.is_explored(Position::new(10, 5)));

        vision.clear_vision_caches();
        assert!(vision.explored().is_empty());
        assert_eq!(vision.ray_cache_len(), 0);
    }
}
