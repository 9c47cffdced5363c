use super::{Activity, ActivityBehavior, ActivityError, ActivityInfo, require_target, single_turn};
use crate::components::{BlockPass, BlockView, Door, SpriteRender};
use crate::ecs::{Entity, World};
use crate::movement::{character_at, position_of};
use crate::sim::{SimContext, Signals};

/// Switches a door between open and closed.
///
/// An open door carries neither `BlockPass` nor `BlockView`; a closed one
/// carries both. The sprite key follows the state and visibility is
/// flagged for recomputation.
pub fn apply_door_state(world: &mut World, signals: &mut Signals, door: Entity, open: bool) -> bool {
    let Some(state) = world.get_mut::<Door>(door) else {
        return false;
    };
    if state.is_open == open {
        return false;
    }
    state.is_open = open;
    let key = state.sprite_key();

    if open {
        world.remove::<BlockPass>(door);
        world.remove::<BlockView>(door);
    } else {
        world.insert(door, BlockPass);
        world.insert(door, BlockView);
    }
    if let Some(sprite) = world.get_mut::<SpriteRender>(door) {
        sprite.key = key.to_string();
    }
    signals.force_vision_update = true;
    true
}

fn door_target(activity: &Activity, ctx: &SimContext<'_>) -> Result<Entity, ActivityError> {
    let door = require_target(activity)?;
    if ctx.world.has::<Door>(door) {
        Ok(door)
    } else {
        Err(ActivityError::InvalidTarget(door))
    }
}

pub struct OpenDoorActivity;

impl ActivityBehavior for OpenDoorActivity {
    fn info(&self) -> ActivityInfo {
        ActivityInfo {
            name: "open_door",
            description: "open a door",
            interruptible: false,
            resumable: false,
            ap_cost: 100,
            total_required_ap: 100,
        }
    }

    fn validate(&self, activity: &Activity, ctx: &SimContext<'_>) -> Result<(), ActivityError> {
        door_target(activity, ctx).map(|_| ())
    }

    fn do_turn(&self, activity: &mut Activity, ctx: &mut SimContext<'_>) -> Result<(), ActivityError> {
        let door = door_target(activity, ctx)?;
        single_turn(activity, ctx, |activity, ctx| {
            if apply_door_state(ctx.world, ctx.signals, door, true) {
                let name = activity.actor_name(ctx);
                ctx.log.push(format!("{name} opened the door."));
            }
            Ok(())
        })
    }
}

pub struct CloseDoorActivity;

impl ActivityBehavior for CloseDoorActivity {
    fn info(&self) -> ActivityInfo {
        ActivityInfo {
            name: "close_door",
            description: "close a door",
            interruptible: false,
            resumable: false,
            ap_cost: 100,
            total_required_ap: 100,
        }
    }

    fn validate(&self, activity: &Activity, ctx: &SimContext<'_>) -> Result<(), ActivityError> {
        let door = door_target(activity, ctx)?;
        let occupied = position_of(ctx.world, door)
            .and_then(|position| character_at(ctx.world, position))
            .is_some();
        if occupied {
            Err(ActivityError::DoorwayOccupied(door))
        } else {
            Ok(())
        }
    }

    fn do_turn(&self, activity: &mut Activity, ctx: &mut SimContext<'_>) -> Result<(), ActivityError> {
        let door = door_target(activity, ctx)?;
        single_turn(activity, ctx, |activity, ctx| {
            if apply_door_state(ctx.world, ctx.signals, door, false) {
                let name = activity.actor_name(ctx);
                ctx.log.push(format!("{name} closed the door."));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{DoorOrientation, GridElement};

    #[test]
    fn open_then_close_restores_door() {
        let mut world = World::new();
        let mut signals = Signals::default();
        let door = world.spawn();
        let closed = Door {
            is_open: false,
            orientation: DoorOrientation::Vertical,
        };
        world.insert(door, closed);
        world.insert(door, GridElement::new(3, 3));
        world.insert(door, BlockPass);
        world.insert(door, BlockView);
        world.insert(door, SpriteRender::new("props", closed.sprite_key()));

        assert!(apply_door_state(&mut world, &mut signals, door, true));
        assert!(!world.has::<BlockPass>(door));
        assert!(!world.has::<BlockView>(door));
        assert_eq!(world.get::<SpriteRender>(door).unwrap().key, "door_vertical_open");
        assert!(signals.force_vision_update);

        assert!(apply_door_state(&mut world, &mut signals, door, false));
        assert!(world.has::<BlockPass>(door));
        assert!(world.has::<BlockView>(door));
        assert_eq!(world.get::<Door>(door), Some(&closed));
        assert_eq!(world.get::<SpriteRender>(door).unwrap().key, closed.sprite_key());
    }

    #[test]
    fn reopening_an_open_door_is_a_no_op() {
        let mut world = World::new();
        let mut signals = Signals::default();
        let door = world.spawn();
        world.insert(
            door,
            Door {
                is_open: true,
                orientation: DoorOrientation::Horizontal,
            },
        );
        assert!(!apply_door_state(&mut world, &mut signals, door, true));
        assert!(!signals.force_vision_update);
    }
}
