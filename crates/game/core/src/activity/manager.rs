use std::collections::{BTreeMap, VecDeque};

use super::{Activity, ActivityError, ActivityState};
use crate::components::Dead;
use crate::ecs::Entity;
use crate::sim::SimContext;

/// Ended activities kept for inspection.
pub const HISTORY_CAPACITY: usize = 32;

/// Owns the activity slot of every actor.
///
/// An actor holds at most one activity. A cancelled activity keeps its slot
/// until the next tick boundary, where its Canceled hook runs and the slot
/// is released.
#[derive(Debug, Default)]
pub struct ActivityManager {
    slots: BTreeMap<Entity, Activity>,
    history: VecDeque<Activity>,
}

impl ActivityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and queues an activity for its actor.
    pub fn submit(&mut self, activity: Activity, ctx: &SimContext<'_>) -> Result<(), ActivityError> {
        let actor = activity.actor;
        if !ctx.world.is_alive(actor) {
            return Err(ActivityError::ActorNotFound(actor));
        }
        if self.slots.contains_key(&actor) {
            return Err(ActivityError::Busy(actor));
        }
        activity.kind.behavior().validate(&activity, ctx)?;
        tracing::debug!(%actor, kind = %activity.kind, "activity queued");
        self.slots.insert(actor, activity);
        Ok(())
    }

    /// Cancels the actor's activity; the Canceled hook runs on the next tick.
    pub fn cancel(&mut self, actor: Entity, reason: impl Into<String>) -> Result<(), ActivityError> {
        let activity = self
            .slots
            .get_mut(&actor)
            .ok_or(ActivityError::NoActivity(actor))?;
        if activity.is_ended() {
            return Err(ActivityError::NoActivity(actor));
        }
        if !activity.interruptible {
            return Err(ActivityError::NotInterruptible(actor));
        }
        activity.mark_cancelled(reason);
        Ok(())
    }

    /// Cancels regardless of interruptibility. Used when the actor dies.
    pub fn force_cancel(&mut self, actor: Entity, reason: impl Into<String>) {
        if let Some(activity) = self.slots.get_mut(&actor) {
            activity.mark_cancelled(reason);
        }
    }

    pub fn get(&self, actor: Entity) -> Option<&Activity> {
        self.slots.get(&actor)
    }

    pub fn has_activity(&self, actor: Entity) -> bool {
        self.slots.contains_key(&actor)
    }

    /// Whether the actor has a pending or running activity to advance.
    pub fn is_actionable(&self, actor: Entity) -> bool {
        self.slots.get(&actor).is_some_and(|a| !a.is_ended())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Ended activities, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Activity> {
        self.history.iter()
    }

    pub fn last_ended(&self, actor: Entity) -> Option<&Activity> {
        self.history.iter().rev().find(|a| a.actor == actor)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.history.clear();
    }

    /// Runs deferred Canceled hooks and releases their slots.
    pub fn run_pending_cancellations(&mut self, ctx: &mut SimContext<'_>) {
        let cancelled: Vec<Entity> = self
            .slots
            .iter()
            .filter(|(_, a)| a.canceled_hook_pending)
            .map(|(&actor, _)| actor)
            .collect();

        for actor in cancelled {
            let Some(mut activity) = self.slots.remove(&actor) else {
                continue;
            };
            activity.canceled_hook_pending = false;
            activity.hooks.canceled += 1;
            activity.kind.behavior().canceled(&mut activity, ctx);
            tracing::debug!(
                %actor,
                kind = %activity.kind,
                reason = activity.cancel_reason.as_deref().unwrap_or(""),
                "activity cancelled"
            );
            self.archive(activity);
        }
    }

    /// Applies interruptions requested by systems during the tick.
    pub fn apply_interrupts(&mut self, ctx: &mut SimContext<'_>) {
        for (actor, reason) in std::mem::take(&mut ctx.signals.interrupts) {
            if ctx.world.has::<Dead>(actor) {
                self.force_cancel(actor, reason);
            } else if let Err(err) = self.cancel(actor, reason) {
                tracing::trace!(%actor, %err, "interrupt ignored");
            }
        }
    }

    /// Advances the actor's activity by one scheduler pick.
    ///
    /// A pending activity is validated again before it starts; if that
    /// fails it is cancelled without running Start.
    ///
    /// Returns the state after the pick, or `None` when the actor had nothing
    /// to do.
    pub fn advance(&mut self, actor: Entity, ctx: &mut SimContext<'_>) -> Option<ActivityState> {
        let mut activity = self.slots.remove(&actor)?;
        if activity.is_ended() {
            self.slots.insert(actor, activity);
            return None;
        }
        let behavior = activity.kind.behavior();

        if activity.state == ActivityState::Pending {
            // The world may have moved on since submit.
            if let Err(err) = behavior.validate(&activity, ctx) {
                tracing::debug!(%actor, kind = %activity.kind, %err, "activity no longer valid");
                activity.mark_cancelled(err.to_string());
            } else {
                activity.state = ActivityState::Running;
                activity.hooks.start += 1;
                if let Err(err) = behavior.start(&mut activity, ctx) {
                    activity.mark_cancelled(err.to_string());
                }
            }
        }

        if activity.state == ActivityState::Running {
            if let Err(err) = behavior.do_turn(&mut activity, ctx) {
                tracing::debug!(%actor, kind = %activity.kind, %err, "activity failed");
                activity.mark_cancelled(err.to_string());
            }
        }

        let state = activity.state;
        if state == ActivityState::Complete {
            activity.hooks.finish += 1;
            behavior.finish(&mut activity, ctx);
            self.archive(activity);
        } else {
            self.slots.insert(actor, activity);
        }
        Some(state)
    }

    fn archive(&mut self, activity: Activity) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(activity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BlockPass, GridElement, TurnBased};
    use crate::config::GameConfig;
    use crate::ecs::World;
    use crate::gamelog::GameLog;
    use crate::level::{Level, Position, Tile};
    use crate::movement::position_of;
    use crate::sim::{Signals, TileGrid};

    #[test]
    fn stale_pending_activity_is_cancelled_before_start() {
        let grid = TileGrid::filled(Level::new(4, 4), Tile::floor());
        let mut world = World::new();
        let walker = world.spawn();
        world.insert(walker, GridElement::new(1, 1));
        world.insert(walker, TurnBased::new(200));

        let mut log = GameLog::default();
        let mut signals = Signals::default();
        let config = GameConfig::default();
        let mut ctx = SimContext::new(&mut world, &grid, &mut log, &mut signals, &config);
        let mut manager = ActivityManager::new();
        manager
            .submit(Activity::move_to(walker, Position::new(2, 1)), &ctx)
            .unwrap();

        let crate_box = ctx.world.spawn();
        ctx.world.insert(crate_box, GridElement::new(2, 1));
        ctx.world.insert(crate_box, BlockPass);

        assert_eq!(manager.advance(walker, &mut ctx), Some(ActivityState::Cancelled));
        let activity = manager.get(walker).unwrap();
        assert_eq!(activity.hooks.start, 0);
        assert!(activity.canceled_hook_pending);
        assert_eq!(position_of(ctx.world, walker), Some(Position::new(1, 1)));

        manager.run_pending_cancellations(&mut ctx);
        assert!(!manager.has_activity(walker));
        assert_eq!(manager.last_ended(walker).unwrap().hooks.canceled, 1);
    }
}
