//! Autotile sprite selection from same-kind neighbours.

use bitflags::bitflags;

use crate::level::{Direction, Level, Tile, TileIdx, TileKind};

bitflags! {
    /// Cardinal neighbours sharing the tile's kind.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Connections: u8 {
        const UP = 1;
        const RIGHT = 2;
        const DOWN = 4;
        const LEFT = 8;
    }
}

impl Connections {
    fn from_direction(direction: Direction) -> Self {
        match direction {
            Direction::Up => Self::UP,
            Direction::Right => Self::RIGHT,
            Direction::Down => Self::DOWN,
            Direction::Left => Self::LEFT,
        }
    }
}

/// Wall sprite for each connection mask. Walls are drawn top-down with a
/// visible front face, so several masks share a sprite.
pub const WALL_SPRITE_TABLE: [u16; 16] = [9, 10, 11, 2, 12, 3, 1, 4, 7, 0, 5, 8, 1, 4, 5, 6];

pub fn wall_sprite(mask: Connections) -> u16 {
    WALL_SPRITE_TABLE[usize::from(mask.bits() & 0x0f)]
}

/// Same-kind neighbour mask of the tile at `idx`.
///
/// Out-of-bounds neighbours come back as [`Tile::VOID`] and never connect.
pub fn connections(level: &Level, tiles: &[Tile], idx: TileIdx) -> Connections {
    let kind = tiles[idx.0].kind;
    let mut mask = Connections::empty();
    for direction in Direction::ALL {
        let neighbour = level.neighbour(tiles, idx, direction);
        if neighbour.kind != TileKind::Void && neighbour.kind == kind {
            mask |= Connections::from_direction(direction);
        }
    }
    mask
}

/// Assigns `sprite_index` to every floor and wall tile.
pub fn apply_autotile(level: &Level, tiles: &mut [Tile]) {
    let sprites: Vec<Option<u16>> = (0..tiles.len())
        .map(|i| {
            let idx = TileIdx(i);
            match tiles[i].kind {
                TileKind::Floor => Some(u16::from(connections(level, tiles, idx).bits())),
                TileKind::Wall => Some(wall_sprite(connections(level, tiles, idx))),
                _ => None,
            }
        })
        .collect();
    for (tile, sprite) in tiles.iter_mut().zip(sprites) {
        if let Some(sprite) = sprite {
            tile.sprite_index = sprite;
        }
    }
}
