use super::{Activity, ActivityBehavior, ActivityError, ActivityInfo, require_target, single_turn};
use crate::components::{Attributes, Dead, Pools, display_name};
use crate::ecs::{Entity, World};
use crate::movement::position_of;
use crate::sim::SimContext;

/// Melee damage: attacker strength minus defender defense, at least 1.
pub fn melee_damage(world: &World, attacker: Entity, defender: Entity) -> i32 {
    let strength = world
        .get::<Attributes>(attacker)
        .map_or(0, |a| a.strength.total);
    let defense = world
        .get::<Attributes>(defender)
        .map_or(0, |a| a.defense.total);
    (strength - defense).max(1)
}

pub struct AttackActivity;

impl AttackActivity {
    fn check(activity: &Activity, world: &World) -> Result<Entity, ActivityError> {
        let target = require_target(activity)?;
        if target == activity.actor || !world.has::<Pools>(target) || world.has::<Dead>(target) {
            return Err(ActivityError::InvalidTarget(target));
        }
        let origin = position_of(world, activity.actor)
            .ok_or(ActivityError::ActorNotFound(activity.actor))?;
        match position_of(world, target) {
            Some(at) if origin.chebyshev(at) <= 1 => Ok(target),
            _ => Err(ActivityError::OutOfReach(target)),
        }
    }
}

impl ActivityBehavior for AttackActivity {
    fn info(&self) -> ActivityInfo {
        ActivityInfo {
            name: "attack",
            description: "strike an adjacent character",
            interruptible: false,
            resumable: false,
            ap_cost: 100,
            total_required_ap: 100,
        }
    }

    fn validate(&self, activity: &Activity, ctx: &SimContext<'_>) -> Result<(), ActivityError> {
        Self::check(activity, ctx.world).map(|_| ())
    }

    fn do_turn(&self, activity: &mut Activity, ctx: &mut SimContext<'_>) -> Result<(), ActivityError> {
        let target = Self::check(activity, ctx.world)?;
        single_turn(activity, ctx, |activity, ctx| {
            let damage = melee_damage(ctx.world, activity.actor, target);
            let attacker = activity.actor_name(ctx);
            let defender = display_name(ctx.world, target);

            let killed = match ctx.world.get_mut::<Pools>(target) {
                Some(pools) => {
                    pools.hp.deplete(damage);
                    pools.hp.is_empty()
                }
                None => return Err(ActivityError::InvalidTarget(target)),
            };
            ctx.log
                .push(format!("{attacker} hits {defender} for {damage} damage."));

            if killed {
                ctx.world.insert(target, Dead);
                ctx.log.push(format!("{defender} was defeated."));
            }
            ctx.signals
                .interrupts
                .push((target, format!("attacked by {attacker}")));
            Ok(())
        })
    }
}
