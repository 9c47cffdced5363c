//! Mutable context threaded through every system of a tick.

use crate::components::WarpTarget;
use crate::config::GameConfig;
use crate::ecs::{Entity, World};
use crate::gamelog::GameLog;
use crate::level::{Level, Position, Tile};

/// Finalised tile array of the current floor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    pub level: Level,
    pub tiles: Vec<Tile>,
}

impl TileGrid {
    pub fn new(level: Level, tiles: Vec<Tile>) -> Self {
        debug_assert_eq!(level.tile_count(), tiles.len());
        Self { level, tiles }
    }

    /// Grid of identical tiles.
    pub fn filled(level: Level, tile: Tile) -> Self {
        Self::new(level, vec![tile; level.tile_count()])
    }

    pub fn contains(&self, position: Position) -> bool {
        self.level.contains(position)
    }

    pub fn tile_at(&self, position: Position) -> Tile {
        self.level.tile_at(&self.tiles, position)
    }

    pub fn set(&mut self, position: Position, tile: Tile) {
        if let Some(idx) = self.level.try_index(position) {
            self.tiles[idx.0] = tile;
        }
    }
}

/// Side effects requested by systems and consumed by the floor orchestrator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signals {
    /// Visibility must be recomputed even if the player did not move.
    pub force_vision_update: bool,
    /// The player triggered a floor transition.
    pub warp: Option<WarpTarget>,
    /// External interruptions (e.g. damage) to apply to running activities.
    pub interrupts: Vec<(Entity, String)>,
}

/// Borrowed view of the simulation handed to systems and activity hooks.
pub struct SimContext<'a> {
    pub world: &'a mut World,
    pub grid: &'a TileGrid,
    pub log: &'a mut GameLog,
    pub signals: &'a mut Signals,
    pub config: &'a GameConfig,
}

impl<'a> SimContext<'a> {
    pub fn new(
        world: &'a mut World,
        grid: &'a TileGrid,
        log: &'a mut GameLog,
        signals: &'a mut Signals,
        config: &'a GameConfig,
    ) -> Self {
        Self {
            world,
            grid,
            log,
            signals,
            config,
        }
    }
}
