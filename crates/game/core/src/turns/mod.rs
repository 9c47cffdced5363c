//! AP-based turn scheduler.
//!
//! Every live actor regenerates AP once per tick and then, in entity-id
//! order, advances its current activity by one step. Activities debit AP as
//! they make progress; an actor with too little AP simply waits for later
//! ticks.

pub mod ai;

use crate::activity::{ActivityManager, ActivityState};
use crate::components::{Dead, GridElement, TurnBased};
use crate::ecs::{Entity, World};
use crate::sim::SimContext;

/// Monotonic scheduler clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub fn next(self) -> Tick {
        Tick(self.0 + 1)
    }
}

/// What happened during one scheduler tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: Tick,
    /// Actors whose activity advanced, with the resulting state.
    pub advanced: Vec<(Entity, ActivityState)>,
}

impl TickReport {
    pub fn acted(&self, actor: Entity) -> bool {
        self.advanced.iter().any(|(who, _)| *who == actor)
    }
}

/// Live actors: entities with `TurnBased` and `GridElement` that are not dead.
pub fn live_actors(world: &World) -> Vec<Entity> {
    world
        .query()
        .with::<TurnBased>()
        .with::<GridElement>()
        .without::<Dead>()
        .entities()
}

/// Adds `amount` AP to every live actor, saturating at its maximum.
pub fn regenerate_ap(world: &mut World, amount: i32) {
    if amount <= 0 {
        return;
    }
    for actor in live_actors(world) {
        if let Some(turn) = world.get_mut::<TurnBased>(actor) {
            turn.ap.restore(amount);
        }
    }
}

#[derive(Debug, Default)]
pub struct TurnManager {
    clock: Tick,
}

impl TurnManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clock(&self) -> Tick {
        self.clock
    }

    /// Runs one scheduler tick.
    ///
    /// Order: deferred Canceled hooks, AP regeneration, then one activity
    /// step per live actor in ascending id order.
    pub fn tick(&mut self, activities: &mut ActivityManager, ctx: &mut SimContext<'_>) -> TickReport {
        self.clock = self.clock.next();
        let mut report = TickReport {
            tick: self.clock,
            advanced: Vec::new(),
        };

        activities.run_pending_cancellations(ctx);
        regenerate_ap(ctx.world, ctx.config.ap_recovery);

        for actor in live_actors(ctx.world) {
            if ctx.world.has::<Dead>(actor) || !activities.is_actionable(actor) {
                continue;
            }
            if let Some(state) = activities.advance(actor, ctx) {
                report.advanced.push((actor, state));
            }
            activities.apply_interrupts(ctx);
        }

        tracing::trace!(tick = self.clock.0, advanced = report.advanced.len(), "tick");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Activity;
    use crate::components::{Name, Pool};
    use crate::config::GameConfig;
    use crate::gamelog::GameLog;
    use crate::level::{Level, Position, Tile};
    use crate::sim::{Signals, TileGrid};

    fn actor(world: &mut World, x: i32, ap: i32) -> Entity {
        let entity = world.spawn();
        world.insert(entity, GridElement::new(x, 0));
        world.insert(entity, TurnBased::new(ap));
        entity
    }

    #[test]
    fn regeneration_saturates_at_max() {
        let mut world = World::new();
        let a = actor(&mut world, 0, 100);
        world.get_mut::<TurnBased>(a).unwrap().ap.set_current(90);
        let dead = actor(&mut world, 1, 100);
        world.get_mut::<TurnBased>(dead).unwrap().ap.set_current(0);
        world.insert(dead, Dead);

        regenerate_ap(&mut world, 40);
        assert_eq!(world.get::<TurnBased>(a).unwrap().ap.current(), 100);
        assert_eq!(world.get::<TurnBased>(dead).unwrap().ap.current(), 0);
    }

    #[test]
    fn actors_act_in_id_order_once_per_tick() {
        let grid = TileGrid::filled(Level::new(6, 1), Tile::floor());
        let mut world = World::new();
        let first = actor(&mut world, 0, 500);
        let second = actor(&mut world, 1, 500);
        let idle = actor(&mut world, 4, 500);

        let mut log = GameLog::default();
        let mut signals = Signals::default();
        let config = GameConfig::default().with_ap_recovery(0);
        let mut ctx = SimContext::new(&mut world, &grid, &mut log, &mut signals, &config);
        let mut activities = ActivityManager::new();
        let mut turns = TurnManager::new();

        // Second moves first in submission, but ids decide the order.
        activities
            .submit(Activity::move_to(second, Position::new(2, 0)), &ctx)
            .unwrap();
        activities.submit(Activity::wait(first), &ctx).unwrap();

        let report = turns.tick(&mut activities, &mut ctx);
        assert_eq!(
            report.advanced,
            vec![(first, ActivityState::Complete), (second, ActivityState::Complete)]
        );
        assert!(!report.acted(idle));
        assert_eq!(turns.clock(), Tick(1));
        assert_eq!(ctx.world.get::<TurnBased>(second).unwrap().ap.current(), 400);
    }

    #[test]
    fn interrupted_rest_keeps_spent_ap_and_cancels_once() {
        let grid = TileGrid::filled(Level::new(3, 1), Tile::floor());
        let mut world = World::new();
        let sleeper = actor(&mut world, 0, 500);
        world.insert(sleeper, Name::new("hero"));
        world.insert(
            sleeper,
            crate::components::Pools {
                hp: Pool::new(1, 10),
                ..Default::default()
            },
        );

        let mut log = GameLog::default();
        let mut signals = Signals::default();
        let config = GameConfig::default().with_ap_recovery(0);
        let mut ctx = SimContext::new(&mut world, &grid, &mut log, &mut signals, &config);
        let mut activities = ActivityManager::new();
        let mut turns = TurnManager::new();

        activities.submit(Activity::rest(sleeper, 3), &ctx).unwrap();
        turns.tick(&mut activities, &mut ctx);
        turns.tick(&mut activities, &mut ctx);
        assert_eq!(activities.get(sleeper).unwrap().ap_spent, 200);

        activities.cancel(sleeper, "noise").unwrap();
        turns.tick(&mut activities, &mut ctx);

        assert!(!activities.has_activity(sleeper));
        let ended = activities.last_ended(sleeper).unwrap();
        assert_eq!(ended.state(), ActivityState::Cancelled);
        assert_eq!(ended.hook_calls().canceled, 1);
        assert_eq!(ended.ap_spent, 200);
        assert_eq!(ctx.world.get::<TurnBased>(sleeper).unwrap().ap.current(), 300);

        turns.tick(&mut activities, &mut ctx);
        assert_eq!(activities.last_ended(sleeper).unwrap().hook_calls().canceled, 1);
    }
}
