//! Tile grid and level geometry.
//!
//! A level is a dense `width × height` row-major array of [`Tile`]s. The
//! functions here are pure lookups over that array; out-of-bounds access never
//! panics or wraps, it yields the [`Tile::VOID`] sentinel instead.

use std::fmt;

use arrayvec::ArrayVec;

/// Discrete grid position expressed in tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (king-move) distance.
    pub fn chebyshev(self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    pub fn manhattan(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn euclidean(self, other: Position) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }

    pub fn step(self, direction: Direction) -> Position {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Index into a level's tile array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileIdx(pub usize);

/// The four orthogonal neighbour directions. Screen coordinates: `Up` is `y - 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }
}

/// Canonical terrain classes.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TileKind {
    Floor,
    Wall,
    Dirt,
    Water,
    Bridge,
    Void,
    Empty,
}

impl TileKind {
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn is_walkable(self) -> bool {
        matches!(self, TileKind::Floor | TileKind::Dirt | TileKind::Bridge)
    }
}

/// A passive map cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub kind: TileKind,
    pub block_pass: bool,
    pub block_view: bool,
    pub walkable: bool,
    /// Autotile variant, filled in once the map is finalised.
    pub sprite_index: u16,
}

impl Tile {
    /// Out-of-bounds sentinel.
    pub const VOID: Tile = Tile {
        kind: TileKind::Void,
        block_pass: true,
        block_view: false,
        walkable: false,
        sprite_index: 0,
    };

    pub const fn new(kind: TileKind) -> Self {
        let (block_pass, block_view, walkable) = match kind {
            TileKind::Floor | TileKind::Dirt | TileKind::Bridge => (false, false, true),
            TileKind::Wall => (true, true, false),
            TileKind::Water => (true, false, false),
            TileKind::Void | TileKind::Empty => (true, false, false),
        };
        Self {
            kind,
            block_pass,
            block_view,
            walkable,
            sprite_index: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn floor() -> Self {
        Self::new(TileKind::Floor)
    }

    pub fn wall() -> Self {
        Self::new(TileKind::Wall)
    }
}

/// Fixed level dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Level {
    pub width: i32,
    pub height: i32,
}

impl Level {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn tile_count(&self) -> usize {
        (self.width.max(0) * self.height.max(0)) as usize
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0 && position.y >= 0 && position.x < self.width && position.y < self.height
    }

    /// Row-major index of an in-bounds coordinate.
    pub fn index(&self, x: i32, y: i32) -> TileIdx {
        debug_assert!(self.contains(Position::new(x, y)), "({x}, {y}) outside level");
        TileIdx((y * self.width + x) as usize)
    }

    pub fn try_index(&self, position: Position) -> Option<TileIdx> {
        self.contains(position)
            .then(|| self.index(position.x, position.y))
    }

    pub fn coord(&self, idx: TileIdx) -> Position {
        let i = idx.0 as i32;
        Position::new(i % self.width, i / self.width)
    }

    pub fn neighbour_index(&self, idx: TileIdx, direction: Direction) -> Option<TileIdx> {
        self.try_index(self.coord(idx).step(direction))
    }

    /// Neighbouring tile, or [`Tile::VOID`] when the step leaves the level.
    pub fn neighbour(&self, tiles: &[Tile], idx: TileIdx, direction: Direction) -> Tile {
        self.neighbour_index(idx, direction)
            .and_then(|n| tiles.get(n.0).copied())
            .unwrap_or(Tile::VOID)
    }

    /// Tile at a coordinate, or [`Tile::VOID`] outside the level.
    pub fn tile_at(&self, tiles: &[Tile], position: Position) -> Tile {
        self.try_index(position)
            .and_then(|idx| tiles.get(idx.0).copied())
            .unwrap_or(Tile::VOID)
    }

    /// In-bounds indices of the eight surrounding tiles.
    pub fn neighbours8(&self, idx: TileIdx) -> ArrayVec<TileIdx, 8> {
        let origin = self.coord(idx);
        let mut out = ArrayVec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if let Some(n) = self.try_index(origin.offset(dx, dy)) {
                    out.push(n);
                }
            }
        }
        out
    }

    /// Whether any of the eight neighbours is walkable.
    pub fn adjacent_any_floor(&self, tiles: &[Tile], idx: TileIdx) -> bool {
        self.neighbours8(idx)
            .iter()
            .any(|n| tiles.get(n.0).is_some_and(|tile| tile.walkable))
    }
}

/// Axis-aligned rectangle in tile units; `x..x+w`, `y..y+h`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn x2(&self) -> i32 {
        self.x + self.w
    }

    pub fn y2(&self) -> i32 {
        self.y + self.h
    }

    pub fn center(&self) -> Position {
        Position::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= self.x && position.x < self.x2() && position.y >= self.y && position.y < self.y2()
    }

    /// Overlap test with a one-tile margin, so rooms never share walls.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.x2() && self.x2() >= other.x && self.y <= other.y2() && self.y2() >= other.y
    }

    /// Tiles covered, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (self.y..self.y2()).flat_map(move |y| (self.x..self.x2()).map(move |x| Position::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_and_coord_are_inverse() {
        let level = Level::new(7, 5);
        for y in 0..5 {
            for x in 0..7 {
                let idx = level.index(x, y);
                assert_eq!(level.coord(idx), Position::new(x, y));
            }
        }
        assert_eq!(level.index(3, 2), TileIdx(17));
    }

    #[test]
    fn out_of_bounds_neighbour_is_void() {
        let level = Level::new(3, 3);
        let tiles = vec![Tile::floor(); 9];

        let corner = level.index(0, 0);
        let up = level.neighbour(&tiles, corner, Direction::Up);
        let left = level.neighbour(&tiles, corner, Direction::Left);
        assert_eq!(up.name(), "void");
        assert!(up.block_pass);
        assert_eq!(left, Tile::VOID);

        let right_edge = level.index(2, 1);
        assert_eq!(level.neighbour(&tiles, right_edge, Direction::Right), Tile::VOID);
        assert_eq!(
            level.neighbour(&tiles, right_edge, Direction::Left).kind,
            TileKind::Floor
        );
    }

    #[test]
    fn adjacent_any_floor_checks_diagonals() {
        let level = Level::new(3, 3);
        let mut tiles = vec![Tile::wall(); 9];
        let center = level.index(1, 1);
        assert!(!level.adjacent_any_floor(&tiles, center));

        tiles[level.index(2, 2).0] = Tile::floor();
        assert!(level.adjacent_any_floor(&tiles, center));
    }

    #[test]
    fn rect_geometry() {
        let room = Rect::new(2, 3, 4, 2);
        assert_eq!(room.center(), Position::new(4, 4));
        assert!(room.contains(Position::new(5, 4)));
        assert!(!room.contains(Position::new(6, 4)));
        assert_eq!(room.positions().count(), 8);
        assert!(room.intersects(&Rect::new(6, 3, 2, 2)));
        assert!(!room.intersects(&Rect::new(7, 3, 2, 2)));
    }

    #[test]
    fn tile_kind_names_round_trip() {
        use std::str::FromStr;
        assert_eq!(TileKind::from_str("bridge").ok(), Some(TileKind::Bridge));
        assert_eq!(TileKind::Wall.name(), "wall");
        assert!(TileKind::from_str("lava").is_err());
    }
}
