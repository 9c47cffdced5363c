//! Activities: per-actor finite state machines scheduled by AP.
//!
//! An [`Activity`] records one intent of one actor (move, open a door, rest
//! for a while). Its lifecycle is
//!
//! ```text
//! Pending ──start──▶ Running ──complete──▶ Complete   (Finish hook)
//!                       │
//!                       └──cancel──▶ Cancelled        (Canceled hook, next tick)
//! ```
//!
//! Per-kind behaviour lives behind [`ActivityBehavior`]; the
//! [`ActivityManager`] owns the per-actor slots and drives the hooks.

mod combat;
mod door;
mod item;
mod manager;
mod movement;
mod rest;

pub use combat::{AttackActivity, melee_damage};
pub use door::{CloseDoorActivity, OpenDoorActivity, apply_door_state};
pub use item::{DropActivity, PickUpActivity};
pub use manager::{ActivityManager, HISTORY_CAPACITY};
pub use movement::MoveActivity;
pub use rest::{RestActivity, WaitActivity};

use crate::components::{Hunger, Player, TurnBased, display_name};
use crate::ecs::Entity;
use crate::error::{ErrorSeverity, GameError};
use crate::level::Position;
use crate::sim::SimContext;

/// Lifecycle state of an activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ActivityState {
    Pending,
    Running,
    Complete,
    Cancelled,
}

impl ActivityState {
    /// Complete and Cancelled are terminal.
    pub fn is_ended(self) -> bool {
        matches!(self, ActivityState::Complete | ActivityState::Cancelled)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ActivityKind {
    Move,
    OpenDoor,
    CloseDoor,
    Drop,
    PickUp,
    Attack,
    Rest,
    Wait,
}

impl ActivityKind {
    pub fn behavior(self) -> &'static dyn ActivityBehavior {
        match self {
            ActivityKind::Move => &MoveActivity,
            ActivityKind::OpenDoor => &OpenDoorActivity,
            ActivityKind::CloseDoor => &CloseDoorActivity,
            ActivityKind::Drop => &DropActivity,
            ActivityKind::PickUp => &PickUpActivity,
            ActivityKind::Attack => &AttackActivity,
            ActivityKind::Rest => &RestActivity,
            ActivityKind::Wait => &WaitActivity,
        }
    }

    pub fn info(self) -> ActivityInfo {
        self.behavior().info()
    }
}

/// Static description of an activity kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivityInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub interruptible: bool,
    pub resumable: bool,
    /// AP debited per turn of progress.
    pub ap_cost: i32,
    /// AP that must be spent before the activity completes.
    pub total_required_ap: i32,
}

/// Why an activity could not be started or continued.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActivityError {
    #[error("actor {0} not found")]
    ActorNotFound(Entity),

    #[error("actor {0} already has an activity in progress")]
    Busy(Entity),

    #[error("actor {0} has no activity")]
    NoActivity(Entity),

    #[error("activity of {0} cannot be interrupted")]
    NotInterruptible(Entity),

    #[error("activity requires a target")]
    MissingTarget,

    #[error("activity requires a destination")]
    MissingDestination,

    #[error("target {0} is not valid for this activity")]
    InvalidTarget(Entity),

    #[error("destination {0} is out of bounds")]
    OutOfBounds(Position),

    #[error("destination {0} is not adjacent")]
    NotAdjacent(Position),

    #[error("destination {0} is blocked")]
    Blocked(Position),

    #[error("door {0} cannot be closed while occupied")]
    DoorwayOccupied(Entity),

    #[error("item {0} is not in the actor's backpack")]
    NotInBackpack(Entity),

    #[error("item {0} is not on the actor's tile")]
    NotOnTile(Entity),

    #[error("target {0} is out of reach")]
    OutOfReach(Entity),
}

impl GameError for ActivityError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ActivityError::ActorNotFound(_) => ErrorSeverity::Internal,
            ActivityError::Blocked(_) | ActivityError::Busy(_) => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ActivityError::ActorNotFound(_) => "ACTIVITY_ACTOR_NOT_FOUND",
            ActivityError::Busy(_) => "ACTIVITY_BUSY",
            ActivityError::NoActivity(_) => "ACTIVITY_NONE",
            ActivityError::NotInterruptible(_) => "ACTIVITY_NOT_INTERRUPTIBLE",
            ActivityError::MissingTarget => "ACTIVITY_MISSING_TARGET",
            ActivityError::MissingDestination => "ACTIVITY_MISSING_DESTINATION",
            ActivityError::InvalidTarget(_) => "ACTIVITY_INVALID_TARGET",
            ActivityError::OutOfBounds(_) => "ACTIVITY_OUT_OF_BOUNDS",
            ActivityError::NotAdjacent(_) => "ACTIVITY_NOT_ADJACENT",
            ActivityError::Blocked(_) => "ACTIVITY_BLOCKED",
            ActivityError::DoorwayOccupied(_) => "ACTIVITY_DOORWAY_OCCUPIED",
            ActivityError::NotInBackpack(_) => "ACTIVITY_NOT_IN_BACKPACK",
            ActivityError::NotOnTile(_) => "ACTIVITY_NOT_ON_TILE",
            ActivityError::OutOfReach(_) => "ACTIVITY_OUT_OF_REACH",
        }
    }
}

/// Number of times each lifecycle hook ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct HookCalls {
    pub start: u32,
    pub finish: u32,
    pub canceled: u32,
}

/// Outcome of trying to pay for one turn of progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnPayment {
    Paid,
    /// The actor lacks AP; nothing was debited.
    Insufficient,
}

/// One actor's in-flight intent.
#[derive(Clone, Debug, PartialEq)]
pub struct Activity {
    pub actor: Entity,
    pub kind: ActivityKind,
    pub target: Option<Entity>,
    pub position: Option<Position>,
    pub ap_cost: i32,
    pub total_ap_required: i32,
    pub ap_spent: i32,
    pub interruptible: bool,
    pub resumable: bool,
    pub cancel_reason: Option<String>,
    state: ActivityState,
    hooks: HookCalls,
    canceled_hook_pending: bool,
}

impl Activity {
    pub fn new(actor: Entity, kind: ActivityKind) -> Self {
        let info = kind.info();
        Self {
            actor,
            kind,
            target: None,
            position: None,
            ap_cost: info.ap_cost,
            total_ap_required: info.total_required_ap,
            ap_spent: 0,
            interruptible: info.interruptible,
            resumable: info.resumable,
            cancel_reason: None,
            state: ActivityState::Pending,
            hooks: HookCalls::default(),
            canceled_hook_pending: false,
        }
    }

    pub fn with_target(mut self, target: Entity) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Overrides the AP that must be spent before completion.
    pub fn with_total_ap(mut self, total: i32) -> Self {
        self.total_ap_required = total.max(0);
        self
    }

    // ===== convenience constructors =====

    pub fn move_to(actor: Entity, destination: Position) -> Self {
        Self::new(actor, ActivityKind::Move).with_position(destination)
    }

    pub fn open_door(actor: Entity, door: Entity) -> Self {
        Self::new(actor, ActivityKind::OpenDoor).with_target(door)
    }

    pub fn close_door(actor: Entity, door: Entity) -> Self {
        Self::new(actor, ActivityKind::CloseDoor).with_target(door)
    }

    pub fn drop_item(actor: Entity, item: Entity) -> Self {
        Self::new(actor, ActivityKind::Drop).with_target(item)
    }

    pub fn pick_up(actor: Entity, item: Entity) -> Self {
        Self::new(actor, ActivityKind::PickUp).with_target(item)
    }

    pub fn attack(actor: Entity, target: Entity) -> Self {
        Self::new(actor, ActivityKind::Attack).with_target(target)
    }

    /// Rest for `turns` turns of AP.
    pub fn rest(actor: Entity, turns: u32) -> Self {
        let activity = Self::new(actor, ActivityKind::Rest);
        let total = activity.ap_cost.saturating_mul(turns.max(1) as i32);
        activity.with_total_ap(total)
    }

    pub fn wait(actor: Entity) -> Self {
        Self::new(actor, ActivityKind::Wait)
    }

    // ===== state =====

    pub fn state(&self) -> ActivityState {
        self.state
    }

    pub fn hook_calls(&self) -> HookCalls {
        self.hooks
    }

    pub fn is_ended(&self) -> bool {
        self.state.is_ended()
    }

    pub fn is_complete(&self) -> bool {
        self.state == ActivityState::Complete
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == ActivityState::Cancelled
    }

    /// Whether enough AP has been spent to finish.
    pub fn is_fully_paid(&self) -> bool {
        self.ap_spent >= self.total_ap_required
    }

    /// Marks a running activity as complete. No-op once ended.
    pub fn complete(&mut self) {
        if !self.is_ended() {
            self.state = ActivityState::Complete;
        }
    }

    /// Marks the activity cancelled and schedules its Canceled hook.
    pub(crate) fn mark_cancelled(&mut self, reason: impl Into<String>) {
        if self.is_ended() {
            return;
        }
        self.state = ActivityState::Cancelled;
        self.cancel_reason = Some(reason.into());
        self.canceled_hook_pending = true;
    }

    /// Debits one turn's worth of AP from the actor.
    ///
    /// AP saturates at zero; every successful debit by a player also drains
    /// hunger.
    pub fn spend_turn(&mut self, ctx: &mut SimContext<'_>) -> TurnPayment {
        let cost = self.ap_cost;
        let Some(turn) = ctx.world.get_mut::<TurnBased>(self.actor) else {
            return TurnPayment::Insufficient;
        };
        if turn.ap.current() < cost {
            return TurnPayment::Insufficient;
        }
        turn.ap.deplete(cost);
        self.ap_spent += cost;

        if ctx.world.has::<Player>(self.actor) {
            let drain = ctx.config.hunger_per_action;
            if let Some(hunger) = ctx.world.get_mut::<Hunger>(self.actor) {
                hunger.0.deplete(drain);
            }
        }
        TurnPayment::Paid
    }

    pub(crate) fn actor_name(&self, ctx: &SimContext<'_>) -> String {
        display_name(ctx.world, self.actor)
    }
}

/// Per-kind hooks.
///
/// `validate` runs once when the activity is submitted. `start` runs the
/// first time the scheduler picks the activity, `do_turn` on every pick,
/// `finish` once after completion and `canceled` once after cancellation.
/// An error from `start` or `do_turn` cancels the activity with the error
/// text as reason.
pub trait ActivityBehavior: Sync {
    fn info(&self) -> ActivityInfo;

    fn validate(&self, activity: &Activity, ctx: &SimContext<'_>) -> Result<(), ActivityError>;

    fn start(&self, _activity: &mut Activity, _ctx: &mut SimContext<'_>) -> Result<(), ActivityError> {
        Ok(())
    }

    fn do_turn(&self, activity: &mut Activity, ctx: &mut SimContext<'_>) -> Result<(), ActivityError>;

    fn finish(&self, _activity: &mut Activity, _ctx: &mut SimContext<'_>) {}

    fn canceled(&self, _activity: &mut Activity, _ctx: &mut SimContext<'_>) {}
}

/// Shared `do_turn` body for activities that take exactly one turn.
///
/// With too little AP the activity completes without effect; otherwise the
/// turn is paid and `effect` applied.
pub(crate) fn single_turn(
    activity: &mut Activity,
    ctx: &mut SimContext<'_>,
    effect: impl FnOnce(&mut Activity, &mut SimContext<'_>) -> Result<(), ActivityError>,
) -> Result<(), ActivityError> {
    match activity.spend_turn(ctx) {
        TurnPayment::Paid => {
            effect(activity, ctx)?;
        }
        TurnPayment::Insufficient => {
            tracing::debug!(
                actor = %activity.actor,
                kind = %activity.kind,
                "not enough AP; activity completes without effect"
            );
        }
    }
    activity.complete();
    Ok(())
}

pub(crate) fn require_target(activity: &Activity) -> Result<Entity, ActivityError> {
    activity.target.ok_or(ActivityError::MissingTarget)
}

pub(crate) fn require_position(activity: &Activity) -> Result<Position, ActivityError> {
    activity.position.ok_or(ActivityError::MissingDestination)
}
