use super::{Activity, ActivityBehavior, ActivityError, ActivityInfo, require_target, single_turn};
use crate::components::{InventoryChanged, Item, ItemLocation, display_name};
use crate::movement::position_of;
use crate::sim::SimContext;
use crate::systems::inventory;

pub struct DropActivity;

impl ActivityBehavior for DropActivity {
    fn info(&self) -> ActivityInfo {
        ActivityInfo {
            name: "drop",
            description: "drop an item from the backpack",
            interruptible: false,
            resumable: false,
            ap_cost: 50,
            total_required_ap: 50,
        }
    }

    fn validate(&self, activity: &Activity, ctx: &SimContext<'_>) -> Result<(), ActivityError> {
        let item = require_target(activity)?;
        if !ctx.world.has::<Item>(item) {
            return Err(ActivityError::InvalidTarget(item));
        }
        match ctx.world.get::<ItemLocation>(item) {
            Some(ItemLocation::InBackpack { owner }) if *owner == activity.actor => {}
            _ => return Err(ActivityError::NotInBackpack(item)),
        }
        if position_of(ctx.world, activity.actor).is_none() {
            return Err(ActivityError::ActorNotFound(activity.actor));
        }
        Ok(())
    }

    fn do_turn(&self, activity: &mut Activity, ctx: &mut SimContext<'_>) -> Result<(), ActivityError> {
        self.validate(activity, ctx)?;
        let item = require_target(activity)?;
        single_turn(activity, ctx, |activity, ctx| {
            let position = position_of(ctx.world, activity.actor)
                .ok_or(ActivityError::ActorNotFound(activity.actor))?;
            inventory::place_on_field(ctx.world, item, position);
            ctx.world.insert(activity.actor, InventoryChanged);

            let actor = activity.actor_name(ctx);
            let name = display_name(ctx.world, item);
            ctx.log.push(format!("{actor} dropped {name}."));
            Ok(())
        })
    }
}

pub struct PickUpActivity;

impl ActivityBehavior for PickUpActivity {
    fn info(&self) -> ActivityInfo {
        ActivityInfo {
            name: "pick_up",
            description: "pick up an item from the floor",
            interruptible: false,
            resumable: false,
            ap_cost: 50,
            total_required_ap: 50,
        }
    }

    fn validate(&self, activity: &Activity, ctx: &SimContext<'_>) -> Result<(), ActivityError> {
        let item = require_target(activity)?;
        if !ctx.world.has::<Item>(item) {
            return Err(ActivityError::InvalidTarget(item));
        }
        let on_field = matches!(ctx.world.get::<ItemLocation>(item), Some(ItemLocation::OnField));
        let actor_at = position_of(ctx.world, activity.actor);
        if on_field && actor_at.is_some() && actor_at == position_of(ctx.world, item) {
            Ok(())
        } else {
            Err(ActivityError::NotOnTile(item))
        }
    }

    fn do_turn(&self, activity: &mut Activity, ctx: &mut SimContext<'_>) -> Result<(), ActivityError> {
        self.validate(activity, ctx)?;
        let item = require_target(activity)?;
        single_turn(activity, ctx, |activity, ctx| {
            let name = display_name(ctx.world, item);
            inventory::put_in_backpack(ctx.world, item, activity.actor);

            let actor = activity.actor_name(ctx);
            ctx.log.push(format!("{actor} picked up {name}."));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityManager, ActivityState};
    use crate::components::{GridElement, Name, Stackable, TurnBased};
    use crate::config::GameConfig;
    use crate::ecs::World;
    use crate::gamelog::GameLog;
    use crate::level::{Level, Position, Tile};
    use crate::sim::{Signals, TileGrid};

    #[test]
    fn dropped_items_can_be_picked_up_again() {
        use crate::components::{Interactable, Player};
        use crate::interaction::fire_manual;

        let grid = TileGrid::filled(Level::new(3, 3), Tile::floor());
        let mut world = World::new();
        let actor = world.spawn();
        world.insert(actor, Player);
        world.insert(actor, GridElement::new(1, 1));
        world.insert(actor, TurnBased::new(200));
        let lamp = world.spawn();
        world.insert(lamp, Name::new("lamp"));
        world.insert(lamp, Item::new(1.0, 4));
        world.insert(lamp, ItemLocation::InBackpack { owner: actor });

        let mut log = GameLog::default();
        let mut signals = Signals::default();
        let config = GameConfig::default();
        let mut ctx = SimContext::new(&mut world, &grid, &mut log, &mut signals, &config);
        let mut manager = ActivityManager::new();

        manager.submit(Activity::drop_item(actor, lamp), &ctx).unwrap();
        assert_eq!(manager.advance(actor, &mut ctx), Some(ActivityState::Complete));
        assert!(ctx.world.has::<Interactable>(lamp));

        manager.submit(Activity::pick_up(actor, lamp), &ctx).unwrap();
        assert_eq!(manager.advance(actor, &mut ctx), Some(ActivityState::Complete));
        assert!(!ctx.world.has::<Interactable>(lamp));
        assert_eq!(
            ctx.world.get::<ItemLocation>(lamp),
            Some(&ItemLocation::InBackpack { owner: actor })
        );

        manager.submit(Activity::drop_item(actor, lamp), &ctx).unwrap();
        assert_eq!(manager.advance(actor, &mut ctx), Some(ActivityState::Complete));
        assert_eq!(fire_manual(&mut ctx, actor, lamp), Ok(true));
        assert!(!ctx.world.has::<Interactable>(lamp));
        assert!(ctx.log.contains("picked up lamp"));
    }

    #[test]
    fn pick_up_merges_stack_and_drop_places_on_tile() {
        let grid = TileGrid::filled(Level::new(4, 4), Tile::floor());
        let mut world = World::new();
        let actor = world.spawn();
        world.insert(actor, GridElement::new(2, 2));
        world.insert(actor, TurnBased::new(200));

        let held = world.spawn();
        world.insert(held, Name::new("arrow"));
        world.insert(held, Item { count: 3, ..Item::new(0.1, 1) });
        world.insert(held, Stackable);
        world.insert(held, ItemLocation::InBackpack { owner: actor });

        let loose = world.spawn();
        world.insert(loose, Name::new("arrow"));
        world.insert(loose, Item { count: 2, ..Item::new(0.1, 1) });
        world.insert(loose, Stackable);
        world.insert(loose, ItemLocation::OnField);
        world.insert(loose, GridElement::new(2, 2));

        let mut log = GameLog::default();
        let mut signals = Signals::default();
        let config = GameConfig::default();
        let mut ctx = SimContext::new(&mut world, &grid, &mut log, &mut signals, &config);
        let mut manager = ActivityManager::new();

        manager.submit(Activity::pick_up(actor, loose), &ctx).unwrap();
        assert_eq!(manager.advance(actor, &mut ctx), Some(ActivityState::Complete));
        assert!(!ctx.world.is_alive(loose));
        assert_eq!(ctx.world.get::<Item>(held).unwrap().count, 5);
        assert!(ctx.world.has::<InventoryChanged>(actor));

        manager.submit(Activity::drop_item(actor, held), &ctx).unwrap();
        assert_eq!(manager.advance(actor, &mut ctx), Some(ActivityState::Complete));
        assert_eq!(ctx.world.get::<ItemLocation>(held), Some(&ItemLocation::OnField));
        assert_eq!(
            ctx.world.get::<GridElement>(held).unwrap().position(),
            Position::new(2, 2)
        );
        assert_eq!(ctx.world.get::<TurnBased>(actor).unwrap().ap.current(), 100);
        assert!(ctx.log.contains("dropped arrow"));
    }

    #[test]
    fn drop_rejects_item_owned_by_someone_else() {
        let grid = TileGrid::filled(Level::new(2, 2), Tile::floor());
        let mut world = World::new();
        let actor = world.spawn();
        let other = world.spawn();
        world.insert(actor, GridElement::new(0, 0));
        let item = world.spawn();
        world.insert(item, Item::new(1.0, 1));
        world.insert(item, ItemLocation::InBackpack { owner: other });

        let mut log = GameLog::default();
        let mut signals = Signals::default();
        let config = GameConfig::default();
        let ctx = SimContext::new(&mut world, &grid, &mut log, &mut signals, &config);
        assert_eq!(
            ActivityManager::new()
                .submit(Activity::drop_item(actor, item), &ctx)
                .unwrap_err(),
            ActivityError::NotInBackpack(item)
        );
    }
}
