//! Tile occupancy queries and single-step movement.

use crate::components::{BlockPass, Dead, GridElement, is_character};
use crate::ecs::{Entity, World};
use crate::level::Position;
use crate::sim::TileGrid;

/// Live entities whose `GridElement` sits on `position`, in id order.
pub fn entities_at(world: &World, position: Position) -> Vec<Entity> {
    world
        .iter::<GridElement>()
        .filter(|(_, grid)| grid.position() == position)
        .map(|(entity, _)| entity)
        .collect()
}

/// Living character standing on `position`.
pub fn character_at(world: &World, position: Position) -> Option<Entity> {
    entities_at(world, position)
        .into_iter()
        .find(|&entity| is_character(world, entity) && !world.has::<Dead>(entity))
}

pub fn position_of(world: &World, entity: Entity) -> Option<Position> {
    world.get::<GridElement>(entity).map(GridElement::position)
}

/// Whether `mover` may step onto `destination`.
///
/// The destination must be inside the map, walkable terrain, free of
/// pass-blocking entities and not occupied by another living character.
pub fn can_move_to(world: &World, grid: &TileGrid, destination: Position, mover: Entity) -> bool {
    if !grid.contains(destination) || !grid.tile_at(destination).walkable {
        return false;
    }
    entities_at(world, destination).into_iter().all(|other| {
        if other == mover {
            return true;
        }
        if world.has::<BlockPass>(other) {
            return false;
        }
        !(is_character(world, other) && !world.has::<Dead>(other))
    })
}

/// Moves `entity` to `destination` unconditionally.
pub fn place(world: &mut World, entity: Entity, destination: Position) -> bool {
    match world.get_mut::<GridElement>(entity) {
        Some(grid) => {
            *grid = GridElement::from(destination);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Ai, AiBehavior, Player};
    use crate::level::{Level, Tile};

    fn open_grid() -> TileGrid {
        TileGrid::filled(Level::new(5, 5), Tile::floor())
    }

    #[test]
    fn blocked_by_wall_entity_and_other_character() {
        let grid = open_grid();
        let mut world = World::new();
        let player = world.spawn();
        world.insert(player, Player);
        world.insert(player, GridElement::new(1, 1));

        let wall = world.spawn();
        world.insert(wall, GridElement::new(2, 1));
        world.insert(wall, BlockPass);

        let goblin = world.spawn();
        world.insert(goblin, GridElement::new(1, 2));
        world.insert(
            goblin,
            Ai {
                behavior: AiBehavior::Hostile,
            },
        );

        assert!(!can_move_to(&world, &grid, Position::new(2, 1), player));
        assert!(!can_move_to(&world, &grid, Position::new(1, 2), player));
        assert!(can_move_to(&world, &grid, Position::new(0, 1), player));
        assert!(can_move_to(&world, &grid, Position::new(1, 1), player));
        assert!(!can_move_to(&world, &grid, Position::new(-1, 1), player));

        world.insert(goblin, Dead);
        assert!(can_move_to(&world, &grid, Position::new(1, 2), player));
    }

    #[test]
    fn unwalkable_terrain_rejects() {
        let mut grid = open_grid();
        grid.set(Position::new(3, 3), Tile::wall());
        let mut world = World::new();
        let mover = world.spawn();
        assert!(!can_move_to(&world, &grid, Position::new(3, 3), mover));
    }
}
