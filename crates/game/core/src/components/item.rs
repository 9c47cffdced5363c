use crate::ecs::Entity;

/// An item. `count` is only meaningful for [`Stackable`] items.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Item {
    /// Weight of a single unit.
    pub weight: f64,
    pub value: i32,
    pub count: u32,
}

impl Item {
    pub fn new(weight: f64, value: i32) -> Self {
        Self {
            weight,
            value,
            count: 1,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.weight * f64::from(self.count)
    }
}

/// Items of the same name merge into one entity with a count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Stackable;

/// Equipment slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EquipSlot {
    Head,
    Torso,
    Legs,
    Jewelry,
    Weapon,
}

/// Where an item currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemLocation {
    InBackpack { owner: Entity },
    Equipped { owner: Entity, slot: EquipSlot },
    OnField,
}

impl ItemLocation {
    /// Owner for backpack and equipped items.
    pub fn owner(&self) -> Option<Entity> {
        match *self {
            ItemLocation::InBackpack { owner } | ItemLocation::Equipped { owner, .. } => {
                Some(owner)
            }
            ItemLocation::OnField => None,
        }
    }
}

/// Attribute bonuses granted while equipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EquipBonus {
    pub vitality: i32,
    pub strength: i32,
    pub sensation: i32,
    pub dexterity: i32,
    pub agility: i32,
}

/// Equippable item data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wearable {
    pub slot: EquipSlot,
    pub defense: i32,
    pub bonus: EquipBonus,
}
