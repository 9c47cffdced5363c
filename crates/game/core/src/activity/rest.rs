use super::{Activity, ActivityBehavior, ActivityError, ActivityInfo, TurnPayment, single_turn};
use crate::components::Pools;
use crate::sim::SimContext;

/// HP recovered per paid turn of rest.
const REST_HP_PER_TURN: i32 = 1;

/// Multi-turn rest. Interruptible; waits for AP instead of giving up.
pub struct RestActivity;

impl ActivityBehavior for RestActivity {
    fn info(&self) -> ActivityInfo {
        ActivityInfo {
            name: "rest",
            description: "rest to recover health",
            interruptible: true,
            resumable: true,
            ap_cost: 100,
            total_required_ap: 100,
        }
    }

    fn validate(&self, activity: &Activity, ctx: &SimContext<'_>) -> Result<(), ActivityError> {
        if ctx.world.is_alive(activity.actor) {
            Ok(())
        } else {
            Err(ActivityError::ActorNotFound(activity.actor))
        }
    }

    fn start(&self, activity: &mut Activity, ctx: &mut SimContext<'_>) -> Result<(), ActivityError> {
        let name = activity.actor_name(ctx);
        ctx.log.push(format!("{name} started resting."));
        Ok(())
    }

    fn do_turn(&self, activity: &mut Activity, ctx: &mut SimContext<'_>) -> Result<(), ActivityError> {
        if activity.spend_turn(ctx) == TurnPayment::Insufficient {
            return Ok(());
        }
        if let Some(pools) = ctx.world.get_mut::<Pools>(activity.actor) {
            pools.hp.restore(REST_HP_PER_TURN);
        }
        if activity.is_fully_paid() {
            activity.complete();
        }
        Ok(())
    }

    fn finish(&self, activity: &mut Activity, ctx: &mut SimContext<'_>) {
        let name = activity.actor_name(ctx);
        ctx.log.push(format!("{name} finished resting."));
    }

    fn canceled(&self, activity: &mut Activity, ctx: &mut SimContext<'_>) {
        let name = activity.actor_name(ctx);
        let reason = activity.cancel_reason.as_deref().unwrap_or("interrupted");
        ctx.log.push(format!("{name} stopped resting ({reason})."));
    }
}

/// Skip one turn.
pub struct WaitActivity;

impl ActivityBehavior for WaitActivity {
    fn info(&self) -> ActivityInfo {
        ActivityInfo {
            name: "wait",
            description: "pass the turn",
            interruptible: false,
            resumable: false,
            ap_cost: 100,
            total_required_ap: 100,
        }
    }

    fn validate(&self, _activity: &Activity, _ctx: &SimContext<'_>) -> Result<(), ActivityError> {
        Ok(())
    }

    fn do_turn(&self, activity: &mut Activity, ctx: &mut SimContext<'_>) -> Result<(), ActivityError> {
        single_turn(activity, ctx, |_, _| Ok(()))
    }
}
