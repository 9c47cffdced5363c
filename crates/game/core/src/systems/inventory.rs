//! Item ownership mutators.
//!
//! Mutators only move items around and raise the `EquipmentChanged` /
//! `InventoryChanged` flags; derived values are recomputed by
//! [`super::stats`].

use crate::components::{
    ActivationRange, ActivationWay, EquipSlot, EquipmentChanged, GridElement, Interactable, InteractionPayload,
    InventoryChanged, Item, ItemLocation, Name, Stackable, Wearable,
};
use crate::ecs::{Entity, World};
use crate::error::{ErrorSeverity, GameError};
use crate::level::Position;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("entity {0} is not an item")]
    NotAnItem(Entity),

    #[error("item {0} cannot be equipped")]
    NotWearable(Entity),

    #[error("item {item} is not carried by {owner}")]
    NotCarried { item: Entity, owner: Entity },

    #[error("item {0} is not equipped")]
    NotEquipped(Entity),

    #[error("count of item {item} would become negative ({current} + {delta})")]
    NegativeCount { item: Entity, current: u32, delta: i64 },
}

impl GameError for InventoryError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            InventoryError::NotAnItem(_) => "INVENTORY_NOT_AN_ITEM",
            InventoryError::NotWearable(_) => "INVENTORY_NOT_WEARABLE",
            InventoryError::NotCarried { .. } => "INVENTORY_NOT_CARRIED",
            InventoryError::NotEquipped(_) => "INVENTORY_NOT_EQUIPPED",
            InventoryError::NegativeCount { .. } => "INVENTORY_NEGATIVE_COUNT",
        }
    }
}

/// Items in `owner`'s backpack, in id order.
pub fn backpack_items(world: &World, owner: Entity) -> Vec<Entity> {
    world
        .iter::<ItemLocation>()
        .filter(|(_, loc)| matches!(loc, ItemLocation::InBackpack { owner: o } if *o == owner))
        .map(|(item, _)| item)
        .collect()
}

/// Items `owner` has equipped, in id order.
pub fn equipped_items(world: &World, owner: Entity) -> Vec<Entity> {
    world
        .iter::<ItemLocation>()
        .filter(|(_, loc)| matches!(loc, ItemLocation::Equipped { owner: o, .. } if *o == owner))
        .map(|(item, _)| item)
        .collect()
}

/// Item equipped in `slot`, if any.
pub fn equipped_in(world: &World, owner: Entity, slot: EquipSlot) -> Option<Entity> {
    world.iter::<ItemLocation>().find_map(|(item, loc)| match loc {
        ItemLocation::Equipped { owner: o, slot: s } if *o == owner && *s == slot => Some(item),
        _ => None,
    })
}

/// Equips a carried item, returning whatever previously occupied the slot
/// to the backpack.
pub fn equip(world: &mut World, item: Entity, owner: Entity) -> Result<Option<Entity>, InventoryError> {
    let slot = world
        .get::<Wearable>(item)
        .map(|w| w.slot)
        .ok_or(InventoryError::NotWearable(item))?;
    if world.get::<ItemLocation>(item).and_then(ItemLocation::owner) != Some(owner) {
        return Err(InventoryError::NotCarried { item, owner });
    }

    let previous = equipped_in(world, owner, slot).filter(|&p| p != item);
    if let Some(previous) = previous {
        world.insert(previous, ItemLocation::InBackpack { owner });
    }
    world.insert(item, ItemLocation::Equipped { owner, slot });
    world.insert(owner, EquipmentChanged);
    Ok(previous)
}

/// Moves an equipped item back to its owner's backpack.
pub fn unequip(world: &mut World, item: Entity) -> Result<Entity, InventoryError> {
    match world.get::<ItemLocation>(item).copied() {
        Some(ItemLocation::Equipped { owner, .. }) => {
            world.insert(item, ItemLocation::InBackpack { owner });
            world.insert(owner, EquipmentChanged);
            Ok(owner)
        }
        _ => Err(InventoryError::NotEquipped(item)),
    }
}

/// Adjusts a stack count, deleting the item entity at zero.
///
/// Returns the new count.
pub fn change_item_count(world: &mut World, item: Entity, delta: i64) -> Result<u32, InventoryError> {
    let current = world
        .get::<Item>(item)
        .map(|i| i.count)
        .ok_or(InventoryError::NotAnItem(item))?;
    let next = i64::from(current) + delta;
    if next < 0 {
        return Err(InventoryError::NegativeCount {
            item,
            current,
            delta,
        });
    }
    let owner = world.get::<ItemLocation>(item).and_then(ItemLocation::owner);
    if next == 0 {
        world.despawn(item);
    } else if let Some(data) = world.get_mut::<Item>(item) {
        data.count = u32::try_from(next).unwrap_or(u32::MAX);
    }
    if let Some(owner) = owner {
        world.insert(owner, InventoryChanged);
    }
    Ok(next as u32)
}

fn item_name(world: &World, item: Entity) -> Option<&str> {
    world.get::<Name>(item).map(|n| n.0.as_str())
}

/// Consolidates stackable duplicates named `name` in `owner`'s backpack into
/// the lowest-id entity. Returns the surviving entity.
pub fn merge_inventory_item(world: &mut World, owner: Entity, name: &str) -> Option<Entity> {
    let stacks: Vec<Entity> = backpack_items(world, owner)
        .into_iter()
        .filter(|&item| world.has::<Stackable>(item) && item_name(world, item) == Some(name))
        .collect();
    let (&keep, rest) = stacks.split_first()?;

    let extra: u32 = rest
        .iter()
        .filter_map(|&item| world.get::<Item>(item).map(|i| i.count))
        .sum();
    for &item in rest {
        world.despawn(item);
    }
    if extra > 0 {
        if let Some(data) = world.get_mut::<Item>(keep) {
            data.count += extra;
        }
        world.insert(owner, InventoryChanged);
    }
    Some(keep)
}

/// Lays `item` on the floor at `position` with a same-tile pick-up trigger.
pub fn place_on_field(world: &mut World, item: Entity, position: Position) {
    world.insert(item, ItemLocation::OnField);
    world.insert(item, GridElement::from(position));
    world.insert(
        item,
        Interactable::new(
            ActivationRange::SameTile,
            ActivationWay::Manual,
            InteractionPayload::Pickup,
        ),
    );
}

/// Places `item` in `owner`'s backpack, merging it into an existing stack
/// when stackable. Returns the entity that now holds the item.
pub fn put_in_backpack(world: &mut World, item: Entity, owner: Entity) -> Entity {
    world.remove::<GridElement>(item);
    world.remove::<Interactable>(item);
    world.insert(item, ItemLocation::InBackpack { owner });
    world.insert(owner, InventoryChanged);
    if !world.has::<Stackable>(item) {
        return item;
    }
    let name = item_name(world, item).map(str::to_owned);
    match name {
        Some(name) => merge_inventory_item(world, owner, &name).unwrap_or(item),
        None => item,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::EquipBonus;

    fn sword(world: &mut World, owner: Entity) -> Entity {
        let item = world.spawn();
        world.insert(item, Name::new("sword"));
        world.insert(item, Item::new(3.0, 10));
        world.insert(
            item,
            Wearable {
                slot: EquipSlot::Weapon,
                defense: 0,
                bonus: EquipBonus {
                    strength: 2,
                    ..EquipBonus::default()
                },
            },
        );
        world.insert(item, ItemLocation::InBackpack { owner });
        item
    }

    #[test]
    fn equip_swaps_previous_item_back_to_backpack() {
        let mut world = World::new();
        let owner = world.spawn();
        let first = sword(&mut world, owner);
        let second = sword(&mut world, owner);

        assert_eq!(equip(&mut world, first, owner), Ok(None));
        assert_eq!(equip(&mut world, second, owner), Ok(Some(first)));
        assert_eq!(equipped_items(&world, owner), vec![second]);
        assert_eq!(backpack_items(&world, owner), vec![first]);
        assert!(world.has::<EquipmentChanged>(owner));

        assert_eq!(unequip(&mut world, second), Ok(owner));
        assert!(equipped_items(&world, owner).is_empty());
        assert_eq!(unequip(&mut world, second), Err(InventoryError::NotEquipped(second)));
    }

    #[test]
    fn change_item_count_guards_and_deletes_at_zero() {
        let mut world = World::new();
        let owner = world.spawn();
        let potion = world.spawn();
        world.insert(potion, Item { count: 2, ..Item::new(0.5, 5) });
        world.insert(potion, Stackable);
        world.insert(potion, ItemLocation::InBackpack { owner });

        assert!(matches!(
            change_item_count(&mut world, potion, -3),
            Err(InventoryError::NegativeCount { .. })
        ));
        assert_eq!(change_item_count(&mut world, potion, -1), Ok(1));
        assert_eq!(change_item_count(&mut world, potion, -1), Ok(0));
        assert!(!world.is_alive(potion));
        assert!(world.has::<InventoryChanged>(owner));
    }

    #[test]
    fn field_items_carry_a_pickup_trigger_only_while_on_the_floor() {
        let mut world = World::new();
        let owner = world.spawn();
        let item = sword(&mut world, owner);

        place_on_field(&mut world, item, Position::new(3, 1));
        assert_eq!(world.get::<ItemLocation>(item), Some(&ItemLocation::OnField));
        let trigger = world.get::<Interactable>(item).unwrap();
        assert_eq!(trigger.config.range, ActivationRange::SameTile);
        assert_eq!(trigger.config.way, ActivationWay::Manual);

        assert_eq!(put_in_backpack(&mut world, item, owner), item);
        assert!(!world.has::<Interactable>(item));
        assert!(!world.has::<GridElement>(item));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut world = World::new();
        let owner = world.spawn();
        let mut stacks = Vec::new();
        for count in [1, 4, 2] {
            let item = world.spawn();
            world.insert(item, Name::new("stone"));
            world.insert(item, Item { count, ..Item::new(1.0, 0) });
            world.insert(item, Stackable);
            world.insert(item, ItemLocation::InBackpack { owner });
            stacks.push(item);
        }

        let keep = merge_inventory_item(&mut world, owner, "stone").unwrap();
        assert_eq!(keep, stacks[0]);
        assert_eq!(world.get::<Item>(keep).unwrap().count, 7);
        assert_eq!(merge_inventory_item(&mut world, owner, "stone"), Some(keep));
        assert_eq!(world.get::<Item>(keep).unwrap().count, 7);
        assert_eq!(merge_inventory_item(&mut world, owner, "missing"), None);
    }
}
