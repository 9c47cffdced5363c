use super::{
    Activity, ActivityBehavior, ActivityError, ActivityInfo, require_position, single_turn,
};
use crate::interaction;
use crate::movement::{can_move_to, place, position_of};
use crate::sim::SimContext;

/// Single step onto an adjacent tile.
///
/// Bumping into an on-collision interactable (a closed door) fires it
/// instead of moving.
pub struct MoveActivity;

impl ActivityBehavior for MoveActivity {
    fn info(&self) -> ActivityInfo {
        ActivityInfo {
            name: "move",
            description: "step onto an adjacent tile",
            interruptible: false,
            resumable: false,
            ap_cost: 100,
            total_required_ap: 100,
        }
    }

    fn validate(&self, activity: &Activity, ctx: &SimContext<'_>) -> Result<(), ActivityError> {
        let destination = require_position(activity)?;
        let origin = position_of(ctx.world, activity.actor)
            .ok_or(ActivityError::ActorNotFound(activity.actor))?;
        if !ctx.grid.contains(destination) {
            return Err(ActivityError::OutOfBounds(destination));
        }
        if origin.chebyshev(destination) != 1 {
            return Err(ActivityError::NotAdjacent(destination));
        }
        if can_move_to(ctx.world, ctx.grid, destination, activity.actor)
            || interaction::has_collision_trigger(ctx.world, destination)
        {
            Ok(())
        } else {
            Err(ActivityError::Blocked(destination))
        }
    }

    fn do_turn(&self, activity: &mut Activity, ctx: &mut SimContext<'_>) -> Result<(), ActivityError> {
        let destination = require_position(activity)?;
        single_turn(activity, ctx, |activity, ctx| {
            if can_move_to(ctx.world, ctx.grid, destination, activity.actor) {
                place(ctx.world, activity.actor, destination);
                Ok(())
            } else if interaction::fire_collision(ctx, activity.actor, destination) {
                Ok(())
            } else {
                Err(ActivityError::Blocked(destination))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityManager, ActivityState};
    use crate::components::{GridElement, Player, TurnBased};
    use crate::config::GameConfig;
    use crate::ecs::World;
    use crate::gamelog::GameLog;
    use crate::level::{Level, Position, Tile};
    use crate::sim::{Signals, TileGrid};

    #[test]
    fn move_with_insufficient_ap_completes_without_moving() {
        let grid = TileGrid::filled(Level::new(4, 4), Tile::floor());
        let mut world = World::new();
        let player = world.spawn();
        world.insert(player, Player);
        world.insert(player, GridElement::new(1, 1));
        let mut turn = TurnBased::new(150);
        turn.ap.set_current(30);
        world.insert(player, turn);

        let mut log = GameLog::default();
        let mut signals = Signals::default();
        let config = GameConfig::default();
        let mut ctx = SimContext::new(&mut world, &grid, &mut log, &mut signals, &config);

        let mut manager = ActivityManager::new();
        manager
            .submit(Activity::move_to(player, Position::new(2, 1)), &ctx)
            .unwrap();
        assert_eq!(manager.advance(player, &mut ctx), Some(ActivityState::Complete));
        assert_eq!(
            ctx.world.get::<GridElement>(player).unwrap().position(),
            Position::new(1, 1)
        );
        assert_eq!(ctx.world.get::<TurnBased>(player).unwrap().ap.current(), 30);
    }

    #[test]
    fn rejects_non_adjacent_destination() {
        let grid = TileGrid::filled(Level::new(4, 4), Tile::floor());
        let mut world = World::new();
        let player = world.spawn();
        world.insert(player, GridElement::new(0, 0));
        let mut log = GameLog::default();
        let mut signals = Signals::default();
        let config = GameConfig::default();
        let ctx = SimContext::new(&mut world, &grid, &mut log, &mut signals, &config);

        let err = ActivityManager::new()
            .submit(Activity::move_to(player, Position::new(2, 2)), &ctx)
            .unwrap_err();
        assert_eq!(err, ActivityError::NotAdjacent(Position::new(2, 2)));
    }
}
