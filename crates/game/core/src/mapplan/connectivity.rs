//! Breadth-first reachability over walkable tiles.

use std::collections::VecDeque;

use crate::level::{Direction, Level, Position, Tile, TileIdx};

fn walkable(level: &Level, tiles: &[Tile], position: Position) -> bool {
    level.tile_at(tiles, position).walkable
}

/// Distance map from `sources`; `None` marks unreachable tiles.
pub fn distance_map(level: &Level, tiles: &[Tile], sources: &[Position]) -> Vec<Option<u32>> {
    let mut distances = vec![None; level.tile_count()];
    let mut queue = VecDeque::new();
    for &source in sources {
        let Some(idx) = level.try_index(source) else {
            continue;
        };
        if walkable(level, tiles, source) && distances[idx.0].is_none() {
            distances[idx.0] = Some(0);
            queue.push_back(source);
        }
    }

    while let Some(current) = queue.pop_front() {
        let Some(idx) = level.try_index(current) else {
            continue;
        };
        let next_distance = distances[idx.0].unwrap_or(0) + 1;
        for direction in Direction::ALL {
            let next = current.step(direction);
            let Some(next_idx) = level.try_index(next) else {
                continue;
            };
            if distances[next_idx.0].is_none() && walkable(level, tiles, next) {
                distances[next_idx.0] = Some(next_distance);
                queue.push_back(next);
            }
        }
    }
    distances
}

/// Whether some walkable tile on the top row reaches some walkable tile on
/// the bottom row.
pub fn is_top_bottom_connected(level: &Level, tiles: &[Tile]) -> bool {
    if level.width <= 0 || level.height <= 0 {
        return false;
    }
    let top: Vec<Position> = (0..level.width)
        .map(|x| Position::new(x, 0))
        .filter(|&p| walkable(level, tiles, p))
        .collect();
    if top.is_empty() {
        return false;
    }
    let distances = distance_map(level, tiles, &top);
    let bottom = level.height - 1;
    (0..level.width).any(|x| distances[level.index(x, bottom).0].is_some())
}

/// Walkable tile farthest from `from` by path length.
pub fn farthest_walkable(level: &Level, tiles: &[Tile], from: Position) -> Option<Position> {
    let distances = distance_map(level, tiles, &[from]);
    distances
        .iter()
        .enumerate()
        .filter_map(|(i, d)| d.map(|d| (d, i)))
        // Ties resolve to the lowest index so results stay deterministic.
        .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(_, i)| level.coord(TileIdx(i)))
}
