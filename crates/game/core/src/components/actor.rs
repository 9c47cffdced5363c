use super::pool::Pool;

/// Human readable name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Marks the controllable character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Player;

/// How an AI-driven actor chooses its next activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AiBehavior {
    /// Chases and attacks the player once it is in sight.
    Hostile,
    /// Wanders randomly and never attacks.
    Wander,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ai {
    pub behavior: AiBehavior,
}

/// Set when an entity has died; the dead-cleanup system reacts to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Dead;

/// Participation in the turn scheduler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurnBased {
    pub ap: Pool<i32>,
    /// Flat bonus added on top of the attribute-derived AP maximum.
    pub ap_bonus: i32,
}

impl TurnBased {
    pub fn new(ap_max: i32) -> Self {
        Self {
            ap: Pool::full(ap_max),
            ap_bonus: 0,
        }
    }
}

/// Resource pools derived from attributes.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Pools {
    pub hp: Pool<i32>,
    pub sp: Pool<i32>,
    pub ep: Pool<i32>,
    pub weight: Pool<f64>,
}

/// Satiation of a player; drained by AP-consuming actions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hunger(pub Pool<i32>);

impl Hunger {
    pub const MAX: i32 = 3000;

    pub fn full() -> Self {
        Self(Pool::full(Self::MAX))
    }
}

/// Dirty flag: equipped items changed, attributes need recomputation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct EquipmentChanged;

/// Dirty flag: carried items changed, weight needs recomputation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct InventoryChanged;
