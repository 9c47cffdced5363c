use crate::activity::ActivityManager;
use crate::components::{Dead, Player};
use crate::ecs::{Entity, World};
use crate::movement::position_of;

use super::inventory::{backpack_items, equipped_items, place_on_field};

/// Outcome of one dead-cleanup pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeathReport {
    pub removed: Vec<Entity>,
    pub player_died: bool,
}

/// Processes entities flagged `Dead`.
///
/// Their activities are cancelled. Non-player entities drop everything they
/// carry onto their tile and are deleted; a dead player stays in the store
/// so the session can end on it; `player_died` is reported on every pass
/// while it lies there.
pub fn dead_cleanup(world: &mut World, activities: &mut ActivityManager) -> DeathReport {
    let mut report = DeathReport::default();
    for entity in world.query().with::<Dead>().entities() {
        if activities.is_actionable(entity) {
            activities.force_cancel(entity, "died");
        }

        if world.has::<Player>(entity) {
            report.player_died = true;
            continue;
        }

        let position = position_of(world, entity);
        let carried: Vec<Entity> = backpack_items(world, entity)
            .into_iter()
            .chain(equipped_items(world, entity))
            .collect();
        for item in carried {
            match position {
                Some(position) => place_on_field(world, item, position),
                None => {
                    world.despawn(item);
                }
            }
        }

        world.despawn(entity);
        tracing::debug!(%entity, "removed dead entity");
        report.removed.push(entity);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{GridElement, Interactable, Item, ItemLocation};

    #[test]
    fn dead_monster_drops_loot_and_is_removed() {
        let mut world = World::new();
        let rat = world.spawn();
        world.insert(rat, GridElement::new(4, 2));
        world.insert(rat, Dead);
        let tail = world.spawn();
        world.insert(tail, Item::new(0.2, 1));
        world.insert(tail, ItemLocation::InBackpack { owner: rat });

        let player = world.spawn();
        world.insert(player, Player);

        let mut activities = ActivityManager::new();
        let report = dead_cleanup(&mut world, &mut activities);

        assert_eq!(report.removed, vec![rat]);
        assert!(!report.player_died);
        assert!(!world.is_alive(rat));
        assert_eq!(world.get::<ItemLocation>(tail), Some(&ItemLocation::OnField));
        assert_eq!(world.get::<GridElement>(tail), Some(&GridElement::new(4, 2)));
        assert!(world.has::<Interactable>(tail));

        world.insert(player, Dead);
        for _ in 0..2 {
            let report = dead_cleanup(&mut world, &mut activities);
            assert!(report.player_died);
            assert!(report.removed.is_empty());
        }
        assert!(world.is_alive(player));
    }
}
