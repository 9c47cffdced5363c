//! Floor orchestration.
//!
//! [`Game`] owns the world and every per-floor resource, runs the fixed
//! system order once per [`Game::update`], refreshes visibility in
//! [`Game::draw_pass`] and rebuilds the floor when a warp fires.
//!
//! Update order:
//! interaction dispatch → AI decide → scheduler → dead cleanup →
//! equipment changed → inventory changed.

use crate::activity::{Activity, ActivityError, ActivityManager};
use crate::components::{Dead, ItemLocation, WarpTarget};
use crate::config::GameConfig;
use crate::ecs::{Entity, World};
use crate::error::{ErrorSeverity, GameError};
use crate::gamelog::GameLog;
use crate::interaction::{self, InteractionError};
use crate::level::{Level, Position};
use crate::movement;
use crate::mapplan::{PlanError, PlanHint, PlanResources, PlannerType, plan_floor};
use crate::rng::{GameRng, derive_seed};
use crate::sim::{SimContext, Signals, TileGrid};
use crate::spawner::{FloorSpawn, SpawnError, spawn_floor, spawn_player};
use crate::systems::{self, DeathReport};
use crate::turns::{TickReport, TurnManager, ai};
use crate::vision::VisionState;

/// Seed stream used for floor layouts.
const FLOOR_SEED_CONTEXT: u32 = 1;
/// Seed stream used for AI choices.
const AI_SEED_CONTEXT: u32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum FloorError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error("floor {depth} has no player spawn point")]
    NoSpawnPoint { depth: u32 },
}

impl GameError for FloorError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            FloorError::Plan(err) => err.severity(),
            FloorError::Spawn(err) => err.severity(),
            FloorError::NoSpawnPoint { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            FloorError::Plan(err) => err.error_code(),
            FloorError::Spawn(err) => err.error_code(),
            FloorError::NoSpawnPoint { .. } => "FLOOR_NO_SPAWN_POINT",
        }
    }
}

/// What one [`Game::update`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub tick: TickReport,
    /// Auto triggers that fired this update.
    pub fired: Vec<Entity>,
    /// AI actors that picked a new activity.
    pub decided: Vec<Entity>,
    pub deaths: DeathReport,
    /// Set when the update ended on a new floor.
    pub descended_to: Option<u32>,
}

/// A running session: one player crossing a sequence of floors.
pub struct Game {
    world: World,
    grid: TileGrid,
    log: GameLog,
    signals: Signals,
    config: GameConfig,
    activities: ActivityManager,
    turns: TurnManager,
    vision: VisionState,
    resources: PlanResources,
    ai_rng: GameRng,
    player: Entity,
    base_seed: u64,
    depth: u32,
    planner: PlannerType,
    floor: FloorSpawn,
    hints: Vec<PlanHint>,
    escaped: bool,
    death_logged: bool,
}

impl Game {
    /// Plans and spawns the first floor and places the player on it.
    pub fn new(
        config: GameConfig,
        resources: PlanResources,
        seed: u64,
        planner: PlannerType,
    ) -> Result<Self, FloorError> {
        let mut world = World::new();
        let level = Level::new(config.map_width, config.map_height);
        let plan = plan_floor(derive_seed(seed, 0, FLOOR_SEED_CONTEXT), planner, level, &resources)?;
        let hints = plan.hints.clone();
        let (grid, floor) = spawn_floor(&mut world, plan)?;
        let spawn = floor.player_spawn.ok_or(FloorError::NoSpawnPoint { depth: 0 })?;
        let player = spawn_player(&mut world, &resources.raw, spawn);

        let mut log = GameLog::new(GameConfig::FIELD_LOG_CAPACITY);
        log.push("You enter the ruins.");
        tracing::info!(seed, %planner, width = level.width, height = level.height, "game started");

        Ok(Self {
            vision: VisionState::new(config.vision_radius),
            ai_rng: GameRng::new(derive_seed(seed, 0, AI_SEED_CONTEXT)),
            world,
            grid,
            log,
            signals: Signals::default(),
            config,
            activities: ActivityManager::new(),
            turns: TurnManager::new(),
            resources,
            player,
            base_seed: seed,
            depth: 0,
            planner,
            floor,
            hints,
            escaped: false,
            death_logged: false,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn log(&self) -> &GameLog {
        &self.log
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn activities(&self) -> &ActivityManager {
        &self.activities
    }

    pub fn vision(&self) -> &VisionState {
        &self.vision
    }

    pub fn player(&self) -> Entity {
        self.player
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn planner(&self) -> PlannerType {
        self.planner
    }

    pub fn floor(&self) -> &FloorSpawn {
        &self.floor
    }

    pub fn hints(&self) -> &[PlanHint] {
        &self.hints
    }

    pub fn has_escaped(&self) -> bool {
        self.escaped
    }

    pub fn is_over(&self) -> bool {
        self.escaped || self.world.has::<Dead>(self.player)
    }

    /// Queues an activity, usually for the player.
    pub fn submit(&mut self, activity: Activity) -> Result<(), ActivityError> {
        let ctx = SimContext::new(&mut self.world, &self.grid, &mut self.log, &mut self.signals, &self.config);
        self.activities.submit(activity, &ctx)
    }

    pub fn cancel(&mut self, actor: Entity, reason: impl Into<String>) -> Result<(), ActivityError> {
        self.activities.cancel(actor, reason)
    }

    /// Fires a manual trigger on behalf of the player.
    pub fn interact(&mut self, trigger: Entity) -> Result<bool, InteractionError> {
        let mut ctx = SimContext::new(&mut self.world, &self.grid, &mut self.log, &mut self.signals, &self.config);
        interaction::fire_manual(&mut ctx, self.player, trigger)
    }

    /// Runs one simulation tick in the fixed system order.
    pub fn update(&mut self) -> Result<UpdateReport, FloorError> {
        let mut report = UpdateReport::default();
        {
            let mut ctx = SimContext::new(&mut self.world, &self.grid, &mut self.log, &mut self.signals, &self.config);
            report.fired = interaction::dispatch_auto(&mut ctx);
            report.decided = ai::decide(&mut self.activities, &ctx, &mut self.ai_rng);
            report.tick = self.turns.tick(&mut self.activities, &mut ctx);
        }
        report.deaths = systems::dead_cleanup(&mut self.world, &mut self.activities);
        if report.deaths.player_died && !self.death_logged {
            self.death_logged = true;
            self.log.push("You died.");
        }
        systems::equipment_changed(&mut self.world);
        systems::inventory_changed(&mut self.world);

        match self.signals.warp.take() {
            Some(WarpTarget::Next) => {
                self.descend()?;
                report.descended_to = Some(self.depth);
            }
            Some(WarpTarget::Escape) => {
                self.escaped = true;
                self.log.push("You escaped the ruins.");
                tracing::info!(depth = self.depth, "player escaped");
            }
            None => {}
        }
        Ok(report)
    }

    /// Refreshes visibility for the frame. Returns whether it recomputed.
    pub fn draw_pass(&mut self) -> bool {
        if std::mem::take(&mut self.signals.force_vision_update) {
            self.vision.request_force_update();
        }
        self.vision.update_for_player(&self.world, &self.grid)
    }

    /// Entities that leave with the player: the player and everything it
    /// carries.
    fn travels_with_player(&self, entity: Entity) -> bool {
        entity == self.player
            || self
                .world
                .get::<ItemLocation>(entity)
                .and_then(ItemLocation::owner)
                .is_some_and(|owner| owner == self.player)
    }

    fn next_planner(&self) -> PlannerType {
        if self.planner.is_template() {
            PlannerType::SmallRoom
        } else {
            self.planner
        }
    }

    /// Replaces the current floor with the next one.
    pub fn descend(&mut self) -> Result<(), FloorError> {
        let depth = self.depth + 1;
        let planner = self.next_planner();
        let level = Level::new(self.config.map_width, self.config.map_height);
        let seed = derive_seed(self.base_seed, depth, FLOOR_SEED_CONTEXT);
        let plan = plan_floor(seed, planner, level, &self.resources)?;
        let hints = plan.hints.clone();

        let stale: Vec<Entity> = self
            .world
            .entities()
            .filter(|&entity| !self.travels_with_player(entity))
            .collect();
        for entity in stale {
            self.world.despawn(entity);
        }
        self.activities.clear();
        self.signals = Signals::default();

        let (grid, floor) = spawn_floor(&mut self.world, plan)?;
        let spawn: Position = floor.player_spawn.ok_or(FloorError::NoSpawnPoint { depth })?;
        movement::place(&mut self.world, self.player, spawn);

        self.grid = grid;
        self.floor = floor;
        self.hints = hints;
        self.depth = depth;
        self.planner = planner;
        self.vision.clear_vision_caches();
        self.log.push(format!("You descend to floor {}.", depth + 1));
        tracing::info!(depth, %planner, seed, "floor changed");
        Ok(())
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("depth", &self.depth)
            .field("planner", &self.planner)
            .field("player", &self.player)
            .field("entities", &self.world.len())
            .finish()
    }
}
