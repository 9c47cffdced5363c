//! Meta planners: terrain overlays and entity placement.

use super::{EntitySpec, Exit, ExitKind, MetaMapPlanner, MetaPlan, PlanError, connectivity::farthest_walkable};
use crate::config::GameConfig;
use crate::level::{Direction, Position, Tile, TileIdx, TileKind};
use crate::raw::RawTable;

/// Overwrites every tile with wall.
#[derive(Clone, Copy, Debug, Default)]
pub struct FillWall;

impl MetaMapPlanner for FillWall {
    fn name(&self) -> &'static str {
        "fill_wall"
    }

    fn plan_meta(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        plan.fill(Tile::wall());
        Ok(())
    }
}

/// Carves every planned room.
#[derive(Clone, Copy, Debug)]
pub struct RoomDraw {
    pub floor: TileKind,
}

impl RoomDraw {
    pub fn new(floor: TileKind) -> Self {
        Self { floor }
    }
}

impl MetaMapPlanner for RoomDraw {
    fn name(&self) -> &'static str {
        "room_draw"
    }

    fn plan_meta(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        let rooms = plan.rooms.clone();
        for room in &rooms {
            for position in room.positions() {
                plan.set_tile(position, Tile::new(self.floor));
            }
        }
        Ok(())
    }
}

fn carve(plan: &mut MetaPlan, position: Position, path: &mut Vec<Position>) {
    let tile = plan.tile(position);
    if tile.kind == TileKind::Void {
        return;
    }
    if tile.kind == TileKind::Water {
        plan.set_tile(position, Tile::new(TileKind::Bridge));
    } else if !tile.walkable {
        plan.set_tile(position, Tile::floor());
    }
    path.push(position);
}

/// Joins consecutive rooms with L-shaped corridors.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorridorConnect;

impl MetaMapPlanner for CorridorConnect {
    fn name(&self) -> &'static str {
        "corridor_connect"
    }

    fn plan_meta(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        let rooms = plan.rooms.clone();
        for pair in rooms.windows(2) {
            let (from, to) = (pair[0].center(), pair[1].center());
            let mut path = Vec::new();
            let corner = if plan.rng.chance(0.5) {
                Position::new(to.x, from.y)
            } else {
                Position::new(from.x, to.y)
            };
            for (a, b) in [(from, corner), (corner, to)] {
                let (dx, dy) = ((b.x - a.x).signum(), (b.y - a.y).signum());
                let mut current = a;
                carve(plan, current, &mut path);
                while current != b {
                    current = current.offset(dx, dy);
                    carve(plan, current, &mut path);
                }
            }
            path.dedup();
            plan.corridors.push(path);
        }
        Ok(())
    }
}

/// Blanks out walls that touch no walkable tile. A single pass over a
/// snapshot; walls exposed by the pass stay.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConvertIsolatedWalls;

impl MetaMapPlanner for ConvertIsolatedWalls {
    fn name(&self) -> &'static str {
        "convert_isolated_walls"
    }

    fn plan_meta(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        let snapshot = plan.tiles.clone();
        let mut converted = 0usize;
        for (i, tile) in plan.tiles.iter_mut().enumerate() {
            if tile.kind == TileKind::Wall && !plan.level.adjacent_any_floor(&snapshot, TileIdx(i)) {
                *tile = Tile::new(TileKind::Empty);
                converted += 1;
            }
        }
        tracing::trace!(converted, "isolated walls cleared");
        Ok(())
    }
}

/// Bridges water crossings and opens the map at its top and bottom edges.
///
/// Every vertical water run with walkable banks above and below is a bridge
/// candidate; candidates on every `spacing`-th column (random phase) become
/// bridges, and at least one is always built. When an edge row has no
/// walkable tile, a passage is carved straight in from that edge until it
/// meets walkable ground.
#[derive(Clone, Copy, Debug)]
pub struct BridgeWrap {
    pub spacing: i32,
}

impl Default for BridgeWrap {
    fn default() -> Self {
        Self { spacing: 8 }
    }
}

impl BridgeWrap {
    fn bridge_candidates(plan: &MetaPlan) -> Vec<(i32, i32, i32)> {
        let mut runs = Vec::new();
        for x in 0..plan.level.width {
            let mut y = 0;
            while y < plan.level.height {
                if plan.tile(Position::new(x, y)).kind != TileKind::Water {
                    y += 1;
                    continue;
                }
                let start = y;
                while plan.tile(Position::new(x, y)).kind == TileKind::Water {
                    y += 1;
                }
                let above = plan.is_walkable(Position::new(x, start - 1));
                let below = plan.is_walkable(Position::new(x, y));
                if above && below {
                    runs.push((x, start, y));
                }
            }
        }
        runs
    }

    fn entrance_column(plan: &mut MetaPlan, from_top: bool) -> i32 {
        let room = if from_top {
            plan.rooms.iter().min_by_key(|r| r.y)
        } else {
            plan.rooms.iter().max_by_key(|r| r.y2())
        };
        if let Some(room) = room {
            return room.center().x;
        }
        let columns: Vec<i32> = (0..plan.level.width)
            .filter(|&x| (0..plan.level.height).any(|y| plan.is_walkable(Position::new(x, y))))
            .collect();
        match plan.rng.choose(&columns) {
            Some(&x) => x,
            None => plan.rng.range(0, plan.level.width),
        }
    }

    fn open_edge(plan: &mut MetaPlan, from_top: bool) {
        let edge = if from_top { 0 } else { plan.level.height - 1 };
        if (0..plan.level.width).any(|x| plan.is_walkable(Position::new(x, edge))) {
            return;
        }
        let x = Self::entrance_column(plan, from_top);
        let step = if from_top { 1 } else { -1 };
        let mut path = Vec::new();
        let mut y = edge;
        while plan.level.contains(Position::new(x, y)) && !plan.is_walkable(Position::new(x, y)) {
            carve(plan, Position::new(x, y), &mut path);
            y += step;
        }
        plan.corridors.push(path);
    }
}

impl MetaMapPlanner for BridgeWrap {
    fn name(&self) -> &'static str {
        "bridge_wrap"
    }

    fn plan_meta(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        let candidates = Self::bridge_candidates(plan);
        if !candidates.is_empty() {
            let spacing = self.spacing.max(1);
            let phase = plan.rng.range(0, spacing);
            let mut chosen: Vec<_> = candidates.iter().filter(|c| c.0 % spacing == phase).copied().collect();
            if chosen.is_empty() {
                chosen.extend(plan.rng.choose(&candidates).copied());
            }
            for (x, start, end) in chosen {
                for y in start..end {
                    plan.set_tile(Position::new(x, y), Tile::new(TileKind::Bridge));
                }
            }
        }

        Self::open_edge(plan, true);
        Self::open_edge(plan, false);
        Ok(())
    }
}

/// Picks the player spawn point and puts the exit as far from it as
/// possible.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExitPlacement;

impl MetaMapPlanner for ExitPlacement {
    fn name(&self) -> &'static str {
        "exit_placement"
    }

    fn plan_meta(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        let spawn = match plan.player_spawn() {
            Some(spawn) => spawn,
            None => {
                let spawn = plan.random_free_floor().ok_or(PlanError::PlayerPlacement {
                    attempts: GameConfig::MAX_PLACEMENT_ATTEMPTS,
                })?;
                plan.spawn_points.push(spawn);
                spawn
            }
        };

        match farthest_walkable(&plan.level, &plan.tiles, spawn) {
            Some(position) if position != spawn && !plan.is_occupied(position) => {
                plan.exits.push(Exit {
                    position,
                    kind: ExitKind::Descend,
                });
            }
            _ => tracing::warn!(x = spawn.x, y = spawn.y, "no room for an exit"),
        }
        Ok(())
    }
}

/// Draws `min..=max` names from a table and places each on a free floor
/// tile. Exhausted placement attempts skip the entity.
fn place_from_table(
    plan: &mut MetaPlan,
    table: Option<&RawTable>,
    min: u32,
    max: u32,
    keep_away: i32,
) -> Vec<EntitySpec> {
    let Some(table) = table else {
        return Vec::new();
    };
    let spawn = plan.player_spawn();
    let count = plan.rng.range(min as i32, max as i32 + 1);
    let mut placed: Vec<EntitySpec> = Vec::new();
    for _ in 0..count {
        let Some(name) = table.choose(&mut plan.rng).map(str::to_string) else {
            break;
        };
        let position = plan.random_free_floor_where(|p| {
            spawn.is_none_or(|s| s.chebyshev(p) > keep_away) && placed.iter().all(|spec| spec.position != p)
        });
        match position {
            Some(position) => placed.push(EntitySpec::new(name, position)),
            None => tracing::warn!(table = %table.name, name = %name, "placement attempts exhausted"),
        }
    }
    placed
}

/// Hostile NPCs drawn from an enemy table.
#[derive(Clone, Debug)]
pub struct HostileNpc {
    pub table: String,
    pub min: u32,
    pub max: u32,
}

impl HostileNpc {
    /// Minimum Chebyshev distance between the player spawn and an enemy.
    const SPAWN_CLEARANCE: i32 = 3;

    pub fn new(table: impl Into<String>, min: u32, max: u32) -> Self {
        Self {
            table: table.into(),
            min,
            max: max.max(min),
        }
    }
}

impl MetaMapPlanner for HostileNpc {
    fn name(&self) -> &'static str {
        "hostile_npc"
    }

    fn plan_meta(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        let raw = plan.raw.clone();
        let table = raw.enemy_table(&self.table);
        if table.is_none() {
            tracing::debug!(table = %self.table, "no enemy table, skipping");
        }
        let placed = place_from_table(plan, table, self.min, self.max, Self::SPAWN_CLEARANCE);
        plan.npc_specs.extend(placed);
        Ok(())
    }
}

/// Floor items drawn from an item table.
#[derive(Clone, Debug)]
pub struct ItemPlacement {
    pub table: String,
    pub min: u32,
    pub max: u32,
}

impl ItemPlacement {
    pub fn new(table: impl Into<String>, min: u32, max: u32) -> Self {
        Self {
            table: table.into(),
            min,
            max: max.max(min),
        }
    }
}

impl MetaMapPlanner for ItemPlacement {
    fn name(&self) -> &'static str {
        "item_placement"
    }

    fn plan_meta(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        let raw = plan.raw.clone();
        let table = raw.item_table(&self.table);
        if table.is_none() {
            tracing::debug!(table = %self.table, "no item table, skipping");
        }
        let placed = place_from_table(plan, table, self.min, self.max, 0);
        plan.item_specs.extend(placed);
        Ok(())
    }
}

/// Doors in room entrances and light props along walls.
///
/// Props missing from the raw master are skipped.
#[derive(Clone, Debug)]
pub struct PropPlacement {
    pub door: Option<String>,
    pub light: String,
    pub lights: u32,
}

impl PropPlacement {
    pub fn new(door: Option<String>, light: impl Into<String>, lights: u32) -> Self {
        Self {
            door,
            light: light.into(),
            lights,
        }
    }

    /// A walkable gap with blockers on exactly one opposite pair of sides.
    fn is_doorway(plan: &MetaPlan, position: Position) -> bool {
        if !plan.is_walkable(position) {
            return false;
        }
        let open = |d: Direction| plan.is_walkable(position.step(d));
        let horizontal_walls = !open(Direction::Left) && !open(Direction::Right);
        let vertical_walls = !open(Direction::Up) && !open(Direction::Down);
        (horizontal_walls && open(Direction::Up) && open(Direction::Down))
            || (vertical_walls && open(Direction::Left) && open(Direction::Right))
    }

    fn place_doors(&self, plan: &mut MetaPlan, door: &str) {
        let rooms = plan.rooms.clone();
        for room in rooms {
            let ring = (room.x - 1..=room.x2()).flat_map(|x| [Position::new(x, room.y - 1), Position::new(x, room.y2())]);
            let sides = (room.y..room.y2()).flat_map(|y| [Position::new(room.x - 1, y), Position::new(room.x2(), y)]);
            for position in ring.chain(sides) {
                if Self::is_doorway(plan, position) && !plan.is_occupied(position) {
                    plan.prop_specs.push(EntitySpec::new(door, position));
                }
            }
        }
    }

    fn place_lights(&self, plan: &mut MetaPlan) {
        let mut candidates: Vec<Position> = (0..plan.tiles.len())
            .map(|i| plan.level.coord(TileIdx(i)))
            .filter(|&p| plan.is_walkable(p) && !plan.is_occupied(p))
            .filter(|&p| Direction::ALL.iter().any(|&d| plan.tile(p.step(d)).kind == TileKind::Wall))
            .collect();
        for _ in 0..self.lights {
            if candidates.is_empty() {
                tracing::warn!(prop = %self.light, "no wall-side floor for light");
                break;
            }
            let index = plan.rng.int_n(candidates.len() as u32) as usize;
            let position = candidates.swap_remove(index);
            plan.prop_specs.push(EntitySpec::new(self.light.clone(), position));
        }
    }
}

impl MetaMapPlanner for PropPlacement {
    fn name(&self) -> &'static str {
        "prop_placement"
    }

    fn plan_meta(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        if let Some(door) = self.door.as_deref().filter(|door| plan.raw.has_prop(door)) {
            self.place_doors(plan, door);
        }
        if plan.raw.has_prop(&self.light) {
            self.place_lights(plan);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::level::{Level, Rect};
    use crate::raw::{RawAttributes, RawData, RawEntry, RawMaster, RawMember, RawProp};

    fn plan_from(rows: &[&str]) -> MetaPlan {
        plan_with_raw(rows, RawMaster::default())
    }

    fn plan_with_raw(rows: &[&str], raw: RawMaster) -> MetaPlan {
        let level = Level::new(rows[0].len() as i32, rows.len() as i32);
        let mut plan = MetaPlan::new(level, 9, Arc::new(raw));
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                let tile = match c {
                    '.' => Tile::floor(),
                    '~' => Tile::new(TileKind::Water),
                    ' ' => Tile::new(TileKind::Empty),
                    _ => Tile::wall(),
                };
                plan.set_tile(Position::new(x as i32, y as i32), tile);
            }
        }
        plan
    }

    fn raw_with_enemies() -> RawMaster {
        let member = |name: &str| RawMember {
            name: name.into(),
            attributes: RawAttributes {
                vitality: 1,
                strength: 1,
                sensation: 1,
                dexterity: 1,
                agility: 1,
                defense: 0,
            },
            ai: None,
            sprite: None,
            drop_table: None,
            light: None,
        };
        RawMaster::new(RawData {
            members: vec![member("slime"), member("bat")],
            enemy_tables: vec![RawTable {
                name: "enemies".into(),
                entries: vec![RawEntry::new("slime", 2.0), RawEntry::new("bat", 1.0)],
            }],
            props: vec![RawProp {
                name: "door".into(),
                block_pass: true,
                block_view: true,
                door: false,
                sprite: None,
                light: None,
                interaction: None,
            }],
            ..RawData::default()
        })
        .unwrap()
    }

    #[test]
    fn corridors_join_room_centres() {
        let mut plan = plan_from(&["##########"; 8]);
        plan.rooms = vec![Rect::new(1, 1, 2, 2), Rect::new(6, 4, 3, 3)];
        RoomDraw::new(TileKind::Floor).plan_meta(&mut plan).unwrap();
        CorridorConnect.plan_meta(&mut plan).unwrap();
        assert_eq!(plan.corridors.len(), 1);
        let path = &plan.corridors[0];
        assert_eq!(path.first(), Some(&plan.rooms[0].center()));
        assert_eq!(path.last(), Some(&plan.rooms[1].center()));
        assert!(path.iter().all(|&p| plan.is_walkable(p)));
    }

    #[test]
    fn isolated_walls_are_cleared_in_one_pass() {
        let mut plan = plan_from(&["#####", "#####", "##.##", "#####", "#####"]);
        ConvertIsolatedWalls.plan_meta(&mut plan).unwrap();
        assert_eq!(plan.tile(Position::new(0, 0)).kind, TileKind::Empty);
        assert_eq!(plan.tile(Position::new(1, 1)).kind, TileKind::Wall);
        assert_eq!(plan.tile(Position::new(3, 3)).kind, TileKind::Wall);
        assert_eq!(plan.tile(Position::new(4, 2)).kind, TileKind::Empty);
    }

    #[test]
    fn bridge_wrap_crosses_rivers_and_opens_edges() {
        let mut plan = plan_from(&["#####", "#...#", "~~~~~", "#...#", "#####"]);
        BridgeWrap::default().plan_meta(&mut plan).unwrap();
        assert!(
            (0..5).any(|x| plan.tile(Position::new(x, 2)).kind == TileKind::Bridge),
            "no bridge built"
        );
        assert!(plan.is_connected());
    }

    #[test]
    fn exit_is_farthest_from_spawn() {
        let mut plan = plan_from(&["#.###", "#.###", "#...#", "###.#"]);
        plan.spawn_points.push(Position::new(1, 0));
        ExitPlacement.plan_meta(&mut plan).unwrap();
        assert_eq!(plan.exits[0].position, Position::new(3, 3));
    }

    #[test]
    fn player_placement_fails_without_floor() {
        let mut plan = plan_from(&["###", "###"]);
        assert_eq!(
            ExitPlacement.plan_meta(&mut plan),
            Err(PlanError::PlayerPlacement { attempts: 200 })
        );
    }

    #[test]
    fn enemies_come_from_the_table_on_free_floor() {
        let mut plan = plan_with_raw(&["..........", "..........", "..........", ".........."], raw_with_enemies());
        plan.spawn_points.push(Position::new(0, 0));
        HostileNpc::new("enemies", 3, 3).plan_meta(&mut plan).unwrap();
        assert_eq!(plan.npc_specs.len(), 3);
        assert!(plan.prop_specs.is_empty());
        for spec in &plan.npc_specs {
            assert!(spec.name == "slime" || spec.name == "bat");
            assert!(spec.position.chebyshev(Position::new(0, 0)) > 3);
        }
        let positions: std::collections::HashSet<_> = plan.npc_specs.iter().map(|s| s.position).collect();
        assert_eq!(positions.len(), 3);
    }

    #[test]
    fn unknown_tables_place_nothing() {
        let mut plan = plan_from(&["....."]);
        HostileNpc::new("missing", 2, 4).plan_meta(&mut plan).unwrap();
        ItemPlacement::new("missing", 2, 4).plan_meta(&mut plan).unwrap();
        assert!(plan.npc_specs.is_empty() && plan.item_specs.is_empty());
    }

    #[test]
    fn doors_go_in_room_entrances() {
        let mut plan = plan_with_raw(&["#######", "#...###", "#......", "#...###", "#######"], raw_with_enemies());
        plan.rooms.push(Rect::new(1, 1, 3, 3));
        PropPlacement::new(Some("door".into()), "torch", 2)
            .plan_meta(&mut plan)
            .unwrap();
        assert_eq!(plan.prop_specs, vec![EntitySpec::new("door", Position::new(4, 2))]);
    }
}
