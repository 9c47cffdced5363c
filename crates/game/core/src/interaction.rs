//! Trigger dispatch for `Interactable` entities.
//!
//! `Auto` triggers are fired by [`dispatch_auto`] once per tick against the
//! player's position. `OnCollision` triggers are fired by movement when an
//! actor bumps into them, `Manual` ones by the input layer through
//! [`fire_manual`].

use crate::activity::apply_door_state;
use crate::components::{
    ActivationRange, ActivationWay, Dead, Door, Interactable, InteractionPayload, Player,
    display_name, player_entity,
};
use crate::ecs::{Entity, World};
use crate::error::{ErrorSeverity, GameError};
use crate::level::Position;
use crate::movement::position_of;
use crate::sim::SimContext;
use crate::systems::inventory;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InteractionError {
    #[error("entity {0} is not interactable")]
    NotInteractable(Entity),

    #[error("entity {0} is not a manual trigger")]
    NotManual(Entity),

    #[error("entity {0} is out of activation range")]
    OutOfRange(Entity),
}

impl GameError for InteractionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }
}

/// Whether `actor_at` satisfies the trigger's activation range.
///
/// Unknown ranges log a warning and never match.
fn in_range(trigger: Entity, range: ActivationRange, trigger_at: Position, actor_at: Position) -> bool {
    match range {
        ActivationRange::SameTile => trigger_at == actor_at,
        ActivationRange::Adjacent => trigger_at.chebyshev(actor_at) == 1,
        ActivationRange::Unknown => {
            tracing::warn!(%trigger, "unknown activation range; trigger skipped");
            false
        }
    }
}

/// Interactables with the given activation way, in id order.
fn triggers_with(world: &World, way: ActivationWay) -> Vec<(Entity, Interactable, Position)> {
    world
        .iter::<Interactable>()
        .filter(|(_, i)| i.config.way == way)
        .filter_map(|(entity, i)| Some((entity, i.clone(), position_of(world, entity)?)))
        .collect()
}

/// Fires every `Auto` trigger whose range covers the player.
///
/// Returns the triggers that fired.
pub fn dispatch_auto(ctx: &mut SimContext<'_>) -> Vec<Entity> {
    let mut fired = Vec::new();
    let Some(player) = player_entity(ctx.world).filter(|&p| !ctx.world.has::<Dead>(p)) else {
        return fired;
    };
    let Some(player_at) = position_of(ctx.world, player) else {
        return fired;
    };

    for (entity, interactable, _) in triggers_with(ctx.world, ActivationWay::Unknown) {
        tracing::warn!(%entity, payload = ?interactable.payload, "unknown activation way; trigger skipped");
    }

    for (entity, interactable, at) in triggers_with(ctx.world, ActivationWay::Auto) {
        if !ctx.world.is_alive(entity) {
            continue;
        }
        if in_range(entity, interactable.config.range, at, player_at)
            && apply_payload(ctx, player, entity, &interactable.payload)
        {
            fired.push(entity);
        }
    }
    fired
}

/// Whether an `OnCollision` trigger sits on `position`.
pub fn has_collision_trigger(world: &World, position: Position) -> bool {
    world
        .iter::<Interactable>()
        .filter(|(_, i)| i.config.way == ActivationWay::OnCollision)
        .any(|(entity, _)| position_of(world, entity) == Some(position))
}

/// Fires `OnCollision` triggers at `position` on behalf of `actor`.
pub fn fire_collision(ctx: &mut SimContext<'_>, actor: Entity, position: Position) -> bool {
    let Some(actor_at) = position_of(ctx.world, actor) else {
        return false;
    };
    let mut any = false;
    for (entity, interactable, at) in triggers_with(ctx.world, ActivationWay::OnCollision) {
        if at != position || !in_range(entity, interactable.config.range, at, actor_at) {
            continue;
        }
        any |= apply_payload(ctx, actor, entity, &interactable.payload);
    }
    any
}

/// Fires a `Manual` trigger on behalf of `actor`.
pub fn fire_manual(ctx: &mut SimContext<'_>, actor: Entity, trigger: Entity) -> Result<bool, InteractionError> {
    let interactable = ctx
        .world
        .get::<Interactable>(trigger)
        .cloned()
        .ok_or(InteractionError::NotInteractable(trigger))?;
    if interactable.config.way != ActivationWay::Manual {
        return Err(InteractionError::NotManual(trigger));
    }
    let reachable = match (position_of(ctx.world, trigger), position_of(ctx.world, actor)) {
        (Some(at), Some(actor_at)) => in_range(trigger, interactable.config.range, at, actor_at),
        _ => false,
    };
    if !reachable {
        return Err(InteractionError::OutOfRange(trigger));
    }
    Ok(apply_payload(ctx, actor, trigger, &interactable.payload))
}

fn apply_payload(ctx: &mut SimContext<'_>, actor: Entity, trigger: Entity, payload: &InteractionPayload) -> bool {
    match payload {
        InteractionPayload::Warp(target) => {
            if !ctx.world.has::<Player>(actor) {
                return false;
            }
            if ctx.signals.warp.is_none() {
                ctx.signals.warp = Some(*target);
                tracing::info!(%trigger, ?target, "warp triggered");
            }
            true
        }
        InteractionPayload::Door => {
            let open = ctx.world.get::<Door>(trigger).is_some_and(|d| d.is_open);
            if open {
                return false;
            }
            let opened = apply_door_state(ctx.world, ctx.signals, trigger, true);
            if opened {
                let name = display_name(ctx.world, actor);
                ctx.log.push(format!("{name} opened the door."));
            }
            opened
        }
        InteractionPayload::Pickup => {
            let name = display_name(ctx.world, trigger);
            inventory::put_in_backpack(ctx.world, trigger, actor);
            let who = display_name(ctx.world, actor);
            ctx.log.push(format!("{who} picked up {name}."));
            true
        }
        InteractionPayload::Message(text) => {
            ctx.log.push(text.clone());
            true
        }
    }
}
