//! Activity selection for AI-driven actors.

use crate::activity::{Activity, ActivityManager};
use crate::components::{Ai, AiBehavior, Dead, TurnBased, player_entity};
use crate::config::GameConfig;
use crate::ecs::Entity;
use crate::level::{Direction, Position};
use crate::movement::{can_move_to, position_of};
use crate::rng::GameRng;
use crate::sim::SimContext;

/// Gives every idle AI actor with enough AP a new activity.
///
/// Returns the actors that received one.
pub fn decide(activities: &mut ActivityManager, ctx: &SimContext<'_>, rng: &mut GameRng) -> Vec<Entity> {
    let player = player_entity(ctx.world).filter(|&p| !ctx.world.has::<Dead>(p));
    let player_at = player.and_then(|p| position_of(ctx.world, p));

    let thinkers = ctx
        .world
        .query()
        .with::<Ai>()
        .with::<TurnBased>()
        .without::<Dead>()
        .entities();

    let mut decided = Vec::new();
    for actor in thinkers {
        if activities.has_activity(actor) {
            continue;
        }
        let ap = ctx.world.get::<TurnBased>(actor).map_or(0, |t| t.ap.current());
        if ap < GameConfig::CHEAPEST_ACTION_COST {
            continue;
        }
        let Some(origin) = position_of(ctx.world, actor) else {
            continue;
        };
        let behavior = ctx.world.get::<Ai>(actor).map(|ai| ai.behavior);

        let chase = match (behavior, player, player_at) {
            (Some(AiBehavior::Hostile), Some(target), Some(at))
                if origin.chebyshev(at) <= ctx.config.ai_sight_radius =>
            {
                Some((target, at))
            }
            _ => None,
        };

        let activity = match chase {
            Some((target, at)) if origin.chebyshev(at) <= 1 => Activity::attack(actor, target),
            Some((_, at)) => match step_towards(ctx, actor, origin, at) {
                Some(step) => Activity::move_to(actor, step),
                None => Activity::wait(actor),
            },
            None => match wander_step(ctx, actor, origin, rng) {
                Some(step) => Activity::move_to(actor, step),
                None => Activity::wait(actor),
            },
        };

        match activities.submit(activity, ctx) {
            Ok(()) => decided.push(actor),
            Err(err) => tracing::debug!(%actor, %err, "ai activity rejected"),
        }
    }
    decided
}

/// Adjacent free tile that brings `origin` closest to `goal`.
fn step_towards(ctx: &SimContext<'_>, actor: Entity, origin: Position, goal: Position) -> Option<Position> {
    let current = origin.chebyshev(goal);
    let mut best: Option<(i32, i32, Position)> = None;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let step = origin.offset(dx, dy);
            if !can_move_to(ctx.world, ctx.grid, step, actor) {
                continue;
            }
            let key = (step.chebyshev(goal), step.manhattan(goal));
            if key.0 >= current {
                continue;
            }
            if best.is_none_or(|(c, m, _)| key < (c, m)) {
                best = Some((key.0, key.1, step));
            }
        }
    }
    best.map(|(_, _, step)| step)
}

fn wander_step(ctx: &SimContext<'_>, actor: Entity, origin: Position, rng: &mut GameRng) -> Option<Position> {
    let mut directions = Direction::ALL;
    rng.shuffle(&mut directions);
    directions
        .into_iter()
        .map(|direction| origin.step(direction))
        .find(|&step| can_move_to(ctx.world, ctx.grid, step, actor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityKind;
    use crate::components::{GridElement, Player};
    use crate::ecs::World;
    use crate::gamelog::GameLog;
    use crate::level::{Level, Tile};
    use crate::sim::{Signals, TileGrid};

    fn setup(world: &mut World, goblin_x: i32) -> (Entity, Entity) {
        let player = world.spawn();
        world.insert(player, Player);
        world.insert(player, GridElement::new(0, 0));
        world.insert(player, TurnBased::new(100));
        let goblin = world.spawn();
        world.insert(
            goblin,
            Ai {
                behavior: AiBehavior::Hostile,
            },
        );
        world.insert(goblin, GridElement::new(goblin_x, 0));
        world.insert(goblin, TurnBased::new(100));
        (player, goblin)
    }

    #[test]
    fn hostile_chases_then_attacks() {
        let grid = TileGrid::filled(Level::new(8, 3), Tile::floor());
        let config = GameConfig::default();
        let mut rng = GameRng::new(1);

        let mut world = World::new();
        let (_, goblin) = setup(&mut world, 4);
        let mut log = GameLog::default();
        let mut signals = Signals::default();
        let ctx = SimContext::new(&mut world, &grid, &mut log, &mut signals, &config);
        let mut activities = ActivityManager::new();
        assert_eq!(decide(&mut activities, &ctx, &mut rng), vec![goblin]);
        let chosen = activities.get(goblin).unwrap();
        assert_eq!(chosen.kind, ActivityKind::Move);
        assert_eq!(chosen.position, Some(Position::new(3, 0)));

        let mut world = World::new();
        let (player, goblin) = setup(&mut world, 1);
        let ctx = SimContext::new(&mut world, &grid, &mut log, &mut signals, &config);
        let mut activities = ActivityManager::new();
        decide(&mut activities, &ctx, &mut rng);
        let chosen = activities.get(goblin).unwrap();
        assert_eq!(chosen.kind, ActivityKind::Attack);
        assert_eq!(chosen.target, Some(player));
    }

    #[test]
    fn idle_below_cheapest_cost() {
        let grid = TileGrid::filled(Level::new(8, 3), Tile::floor());
        let config = GameConfig::default();
        let mut world = World::new();
        let (_, goblin) = setup(&mut world, 4);
        world.get_mut::<TurnBased>(goblin).unwrap().ap.set_current(10);
        let mut log = GameLog::default();
        let mut signals = Signals::default();
        let ctx = SimContext::new(&mut world, &grid, &mut log, &mut signals, &config);
        let mut activities = ActivityManager::new();
        assert!(decide(&mut activities, &ctx, &mut GameRng::new(1)).is_empty());
    }
}
