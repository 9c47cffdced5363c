use crate::level::{Position, TileKind};

/// Logical position of an entity in tile units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct GridElement {
    pub x: i32,
    pub y: i32,
}

impl GridElement {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

impl From<Position> for GridElement {
    fn from(position: Position) -> Self {
        Self::new(position.x, position.y)
    }
}

/// Blocks movement through the entity's tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BlockPass;

/// Blocks line of sight through the entity's tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BlockView;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoorOrientation {
    /// Walls to the left and right; passage runs vertically.
    Horizontal,
    /// Walls above and below; passage runs horizontally.
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Door {
    pub is_open: bool,
    pub orientation: DoorOrientation,
}

impl Door {
    /// Sprite key for the current state.
    pub fn sprite_key(&self) -> &'static str {
        match (self.orientation, self.is_open) {
            (DoorOrientation::Horizontal, false) => "door_horizontal_closed",
            (DoorOrientation::Horizontal, true) => "door_horizontal_open",
            (DoorOrientation::Vertical, false) => "door_vertical_closed",
            (DoorOrientation::Vertical, true) => "door_vertical_open",
        }
    }
}

/// Reference into a sprite sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteRender {
    pub sheet: String,
    pub key: String,
}

impl SpriteRender {
    pub fn new(sheet: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            key: key.into(),
        }
    }
}

/// Terrain tile materialised as an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRender {
    pub kind: TileKind,
    pub sprite_index: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Light emitted around the entity's tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSource {
    pub radius: i32,
    pub color: Rgba,
    pub enabled: bool,
}

impl LightSource {
    pub fn new(radius: i32, color: Rgba) -> Self {
        Self {
            radius,
            color,
            enabled: true,
        }
    }
}

/// Where the player must stand for a trigger to fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ActivationRange {
    SameTile,
    Adjacent,
    /// Unrecognised value from data; skipped with a warning.
    #[cfg_attr(feature = "serde", serde(other))]
    Unknown,
}

/// What fires the trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ActivationWay {
    /// Fired by the interaction dispatch system every tick.
    Auto,
    /// Fired by the input layer.
    Manual,
    /// Fired by movement resolution when an actor bumps into it.
    OnCollision,
    #[cfg_attr(feature = "serde", serde(other))]
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InteractionConfig {
    pub range: ActivationRange,
    pub way: ActivationWay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarpTarget {
    /// Descend to the next floor.
    Next,
    /// Leave the dungeon.
    Escape,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionPayload {
    Warp(WarpTarget),
    Door,
    Pickup,
    Message(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interactable {
    pub config: InteractionConfig,
    pub payload: InteractionPayload,
}

impl Interactable {
    pub fn new(range: ActivationRange, way: ActivationWay, payload: InteractionPayload) -> Self {
        Self {
            config: InteractionConfig { range, way },
            payload,
        }
    }
}

/// Furniture and other static decoration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prop {
    pub name: String,
}
