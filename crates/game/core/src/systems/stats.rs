//! Dirty-flag recomputation of derived stats.
//!
//! [`equipment_changed`] must run before [`inventory_changed`] within a tick:
//! attribute changes alter carry capacity, so the former raises the latter's
//! flag.

use super::inventory::{backpack_items, equipped_items};
use crate::components::{
    Attributes, EquipmentChanged, InventoryChanged, Item, Player, Pools, TurnBased, Wearable,
};
use crate::ecs::{Entity, World};

pub fn hp_max(attrs: &Attributes) -> i32 {
    30 + 8 * attrs.vitality.total + attrs.strength.total + attrs.sensation.total
}

pub fn sp_max(attrs: &Attributes) -> i32 {
    2 * attrs.vitality.total + attrs.dexterity.total + attrs.agility.total
}

pub fn ap_max(attrs: &Attributes, bonus: i32) -> i32 {
    100 + 3 * attrs.agility.total + attrs.dexterity.total + bonus
}

pub fn weight_max(attrs: &Attributes) -> f64 {
    10.0 + 2.0 * f64::from(attrs.strength.total)
}

/// Fresh pools for a newly spawned character, filled to their maxima.
pub fn initial_pools(attrs: &Attributes) -> Pools {
    let mut pools = Pools::default();
    pools.hp.set_max(hp_max(attrs));
    pools.hp.set_current(hp_max(attrs));
    pools.sp.set_max(sp_max(attrs));
    pools.sp.set_current(sp_max(attrs));
    pools.weight.set_max(weight_max(attrs));
    pools
}

/// Recomputes attributes and pool maxima for entities flagged with
/// `EquipmentChanged`, then clears the flag.
///
/// Returns the entities processed.
pub fn equipment_changed(world: &mut World) -> Vec<Entity> {
    let flagged = world.query().with::<EquipmentChanged>().entities();
    for &entity in &flagged {
        world.remove::<EquipmentChanged>(entity);

        let equipped: Vec<Wearable> = equipped_items(world, entity)
            .into_iter()
            .filter_map(|item| world.get::<Wearable>(item).copied())
            .collect();

        let Some(attrs) = world.get_mut::<Attributes>(entity) else {
            continue;
        };
        attrs.reset_modifiers();
        for wearable in &equipped {
            attrs.defense.add_modifier(wearable.defense);
            attrs.vitality.add_modifier(wearable.bonus.vitality);
            attrs.strength.add_modifier(wearable.bonus.strength);
            attrs.sensation.add_modifier(wearable.bonus.sensation);
            attrs.dexterity.add_modifier(wearable.bonus.dexterity);
            attrs.agility.add_modifier(wearable.bonus.agility);
        }
        let attrs = *attrs;

        if let Some(pools) = world.get_mut::<Pools>(entity) {
            pools.hp.set_max(hp_max(&attrs));
            pools.sp.set_max(sp_max(&attrs));
        }
        if let Some(turn) = world.get_mut::<TurnBased>(entity) {
            let bonus = turn.ap_bonus;
            turn.ap.set_max(ap_max(&attrs, bonus));
        }
        world.insert(entity, InventoryChanged);
        tracing::trace!(%entity, items = equipped.len(), "equipment recomputed");
    }
    flagged
}

/// Recomputes carried weight for players flagged with `InventoryChanged`,
/// then clears the flag on every flagged entity.
pub fn inventory_changed(world: &mut World) -> Vec<Entity> {
    let flagged = world.query().with::<InventoryChanged>().entities();
    for &entity in &flagged {
        world.remove::<InventoryChanged>(entity);
        if !world.has::<Player>(entity) {
            continue;
        }

        let carried: f64 = backpack_items(world, entity)
            .into_iter()
            .chain(equipped_items(world, entity))
            .filter_map(|item| world.get::<Item>(item).map(Item::total_weight))
            .sum();
        let capacity = world.get::<Attributes>(entity).map(weight_max);

        if let Some(pools) = world.get_mut::<Pools>(entity) {
            if let Some(capacity) = capacity {
                pools.weight.set_max(capacity);
            }
            if carried > pools.weight.max() {
                tracing::debug!(%entity, carried, capacity = pools.weight.max(), "overloaded");
            }
            pools.weight.set_current(carried);
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{EquipBonus, EquipSlot, ItemLocation, Name};
    use crate::systems::inventory::{equip, unequip};

    fn hero(world: &mut World) -> Entity {
        let hero = world.spawn();
        world.insert(hero, Player);
        world.insert(hero, Name::new("hero"));
        let attrs = Attributes::new(5, 4, 3, 2, 6, 1);
        world.insert(hero, initial_pools(&attrs));
        world.insert(hero, TurnBased::new(ap_max(&attrs, 0)));
        world.insert(hero, attrs);
        hero
    }

    fn ring(world: &mut World, owner: Entity) -> Entity {
        let ring = world.spawn();
        world.insert(ring, Item::new(0.5, 100));
        world.insert(
            ring,
            Wearable {
                slot: EquipSlot::Jewelry,
                defense: 2,
                bonus: EquipBonus {
                    vitality: 1,
                    agility: 2,
                    ..EquipBonus::default()
                },
            },
        );
        world.insert(ring, ItemLocation::InBackpack { owner });
        ring
    }

    #[test]
    fn formulas_match_base_attributes() {
        let attrs = Attributes::new(5, 4, 3, 2, 6, 1);
        assert_eq!(hp_max(&attrs), 30 + 40 + 4 + 3);
        assert_eq!(sp_max(&attrs), 10 + 2 + 6);
        assert_eq!(ap_max(&attrs, 5), 100 + 18 + 2 + 5);
        assert_eq!(weight_max(&attrs), 18.0);
    }

    #[test]
    fn equip_then_unequip_restores_totals() {
        let mut world = World::new();
        let hero = hero(&mut world);
        let ring = ring(&mut world, hero);
        let before = *world.get::<Attributes>(hero).unwrap();

        equip(&mut world, ring, hero).unwrap();
        assert_eq!(equipment_changed(&mut world), vec![hero]);
        let worn = *world.get::<Attributes>(hero).unwrap();
        assert_eq!(worn.vitality.total, 6);
        assert_eq!(worn.defense.total, 3);
        assert_eq!(world.get::<Pools>(hero).unwrap().hp.max(), hp_max(&worn));
        assert_eq!(world.get::<TurnBased>(hero).unwrap().ap.max(), ap_max(&worn, 0));
        assert!(world.has::<InventoryChanged>(hero));

        inventory_changed(&mut world);
        assert_eq!(world.get::<Pools>(hero).unwrap().weight.current(), 0.5);

        unequip(&mut world, ring).unwrap();
        equipment_changed(&mut world);
        assert_eq!(*world.get::<Attributes>(hero).unwrap(), before);
    }

    #[test]
    fn second_run_without_mutation_is_a_no_op() {
        let mut world = World::new();
        let hero = hero(&mut world);
        let ring = ring(&mut world, hero);
        equip(&mut world, ring, hero).unwrap();
        equipment_changed(&mut world);
        inventory_changed(&mut world);

        let attrs = *world.get::<Attributes>(hero).unwrap();
        let pools = *world.get::<Pools>(hero).unwrap();
        assert!(equipment_changed(&mut world).is_empty());
        assert!(inventory_changed(&mut world).is_empty());
        assert_eq!(*world.get::<Attributes>(hero).unwrap(), attrs);
        assert_eq!(*world.get::<Pools>(hero).unwrap(), pools);
    }

    #[test]
    fn shrinking_max_clips_current() {
        let mut world = World::new();
        let hero = hero(&mut world);
        world.get_mut::<Attributes>(hero).unwrap().vitality.add_modifier(3);
        world.get_mut::<Pools>(hero).unwrap().hp.set_max(500);
        world.get_mut::<Pools>(hero).unwrap().hp.set_current(500);
        world.insert(hero, EquipmentChanged);

        equipment_changed(&mut world);
        let pools = world.get::<Pools>(hero).unwrap();
        assert_eq!(pools.hp.current(), pools.hp.max());
        assert_eq!(pools.hp.max(), 77);
    }
}
