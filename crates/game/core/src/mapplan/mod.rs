//! Procedural floor planning.
//!
//! A [`PlannerChain`] runs one [`InitialMapPlanner`] followed by an ordered
//! list of [`MetaMapPlanner`]s over a shared [`MetaPlan`]. The initial planner
//! lays down base terrain (and rooms where it has them); meta planners overlay
//! walls, corridors, bridges and entity specs.
//!
//! [`plan_with`] is the top-level entry point. It runs a freshly built chain,
//! verifies that the top edge reaches the bottom edge over walkable tiles and
//! otherwise retries with `seed + 1000 * attempt`. A chain that cannot place
//! the player retries the same way. Once a plan passes,
//! autotile sprite indices are assigned.

mod autotile;
mod connectivity;
mod initial;
mod meta;

pub use autotile::{Connections, WALL_SPRITE_TABLE, apply_autotile, connections, wall_sprite};
pub use connectivity::{distance_map, farthest_walkable, is_top_bottom_connected};
pub use initial::{BigRoomStarter, CaveStarter, ForestStarter, RoomsStarter, RuinsStarter, TemplateStarter};
pub use meta::{
    BridgeWrap, ConvertIsolatedWalls, CorridorConnect, ExitPlacement, FillWall, HostileNpc, ItemPlacement,
    PropPlacement, RoomDraw,
};

use std::sync::Arc;

use crate::config::GameConfig;
use crate::error::{ErrorSeverity, GameError};
use crate::level::{Level, Position, Rect, Tile, TileKind};
use crate::raw::RawMaster;
use crate::rng::GameRng;
use crate::template::{TemplateError, TemplateRegistry};

/// A named entity the spawner should create at a position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntitySpec {
    pub name: String,
    pub position: Position,
}

impl EntitySpec {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitKind {
    /// Stairs down to the next floor.
    Descend,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Exit {
    pub position: Position,
    pub kind: ExitKind,
}

/// Coarse facts about a floor for systems outside the planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlanHint {
    Indoor,
    Outdoor,
    /// Built from chunk templates rather than algorithmically.
    Templated,
}

/// Intermediate artefact of the planner pipeline.
#[derive(Clone, Debug)]
pub struct MetaPlan {
    pub level: Level,
    /// Row-major terrain.
    pub tiles: Vec<Tile>,
    pub rooms: Vec<Rect>,
    pub corridors: Vec<Vec<Position>>,
    pub rng: GameRng,
    pub npc_specs: Vec<EntitySpec>,
    pub item_specs: Vec<EntitySpec>,
    pub prop_specs: Vec<EntitySpec>,
    pub exits: Vec<Exit>,
    /// Player spawn candidates; the first entry is used.
    pub spawn_points: Vec<Position>,
    pub hints: Vec<PlanHint>,
    /// Seed of the attempt that produced this plan.
    pub seed: u64,
    pub raw: Arc<RawMaster>,
}

impl MetaPlan {
    pub fn new(level: Level, seed: u64, raw: Arc<RawMaster>) -> Self {
        Self {
            level,
            tiles: vec![Tile::new(TileKind::Empty); level.tile_count()],
            rooms: Vec::new(),
            corridors: Vec::new(),
            rng: GameRng::new(seed),
            npc_specs: Vec::new(),
            item_specs: Vec::new(),
            prop_specs: Vec::new(),
            exits: Vec::new(),
            spawn_points: Vec::new(),
            hints: Vec::new(),
            seed,
            raw,
        }
    }

    /// Tile at `position`, or [`Tile::VOID`] out of bounds.
    pub fn tile(&self, position: Position) -> Tile {
        self.level.tile_at(&self.tiles, position)
    }

    pub fn set_tile(&mut self, position: Position, tile: Tile) {
        if let Some(idx) = self.level.try_index(position) {
            self.tiles[idx.0] = tile;
        }
    }

    pub fn fill(&mut self, tile: Tile) {
        self.tiles.iter_mut().for_each(|t| *t = tile);
    }

    pub fn is_walkable(&self, position: Position) -> bool {
        self.tile(position).walkable
    }

    /// Whether a spec, exit or spawn point already claims `position`.
    pub fn is_occupied(&self, position: Position) -> bool {
        self.npc_specs.iter().any(|s| s.position == position)
            || self.item_specs.iter().any(|s| s.position == position)
            || self.prop_specs.iter().any(|s| s.position == position)
            || self.exits.iter().any(|e| e.position == position)
            || self.spawn_points.contains(&position)
    }

    /// Random walkable, unclaimed tile within the placement budget.
    pub fn random_free_floor(&mut self) -> Option<Position> {
        self.random_free_floor_where(|_| true)
    }

    /// Like [`random_free_floor`](Self::random_free_floor), additionally
    /// requiring `accept`.
    pub fn random_free_floor_where(&mut self, accept: impl Fn(Position) -> bool) -> Option<Position> {
        for _ in 0..GameConfig::MAX_PLACEMENT_ATTEMPTS {
            let x = self.rng.range(0, self.level.width);
            let y = self.rng.range(0, self.level.height);
            let position = Position::new(x, y);
            if self.is_walkable(position) && !self.is_occupied(position) && accept(position) {
                return Some(position);
            }
        }
        None
    }

    pub fn player_spawn(&self) -> Option<Position> {
        self.spawn_points.first().copied()
    }

    pub fn is_connected(&self) -> bool {
        is_top_bottom_connected(&self.level, &self.tiles)
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("no top-to-bottom path after {attempts} attempts from seed {seed}")]
    Connectivity { seed: u64, attempts: u32 },

    #[error("no free floor tile for the player after {attempts} attempts")]
    PlayerPlacement { attempts: u32 },

    #[error("unknown terrain '{name}'")]
    UnknownTerrain { name: String },

    #[error("chunk '{chunk}' of size {size:?} does not fit a {width}x{height} level")]
    TemplateTooLarge {
        chunk: String,
        size: (i32, i32),
        width: i32,
        height: i32,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl GameError for PlanError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            PlanError::Connectivity { .. } | PlanError::PlayerPlacement { .. } => ErrorSeverity::Recoverable,
            PlanError::UnknownTerrain { .. } | PlanError::TemplateTooLarge { .. } | PlanError::Template(_) => {
                ErrorSeverity::Integrity
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            PlanError::Connectivity { .. } => "PLAN_CONNECTIVITY",
            PlanError::PlayerPlacement { .. } => "PLAN_PLAYER_PLACEMENT",
            PlanError::UnknownTerrain { .. } => "PLAN_UNKNOWN_TERRAIN",
            PlanError::TemplateTooLarge { .. } => "PLAN_TEMPLATE_TOO_LARGE",
            PlanError::Template(err) => err.error_code(),
        }
    }
}

/// Writes base terrain and rooms into an empty plan.
pub trait InitialMapPlanner {
    fn name(&self) -> &'static str;

    fn plan_initial(&self, plan: &mut MetaPlan) -> Result<(), PlanError>;
}

/// Overlays terrain or entity specs onto a plan.
pub trait MetaMapPlanner {
    fn name(&self) -> &'static str;

    fn plan_meta(&self, plan: &mut MetaPlan) -> Result<(), PlanError>;
}

pub struct PlannerChain {
    starter: Box<dyn InitialMapPlanner>,
    planners: Vec<Box<dyn MetaMapPlanner>>,
}

impl PlannerChain {
    pub fn new(starter: impl InitialMapPlanner + 'static) -> Self {
        Self {
            starter: Box::new(starter),
            planners: Vec::new(),
        }
    }

    pub fn with(mut self, planner: impl MetaMapPlanner + 'static) -> Self {
        self.planners.push(Box::new(planner));
        self
    }

    pub fn run(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        tracing::debug!(planner = self.starter.name(), seed = plan.seed, "initial planner");
        self.starter.plan_initial(plan)?;
        for planner in &self.planners {
            tracing::debug!(planner = planner.name(), "meta planner");
            planner.plan_meta(plan)?;
        }
        Ok(())
    }
}

/// Shared data handed to planner construction.
#[derive(Clone, Debug)]
pub struct PlanResources {
    pub raw: Arc<RawMaster>,
    pub templates: Arc<TemplateRegistry>,
    pub enemy_table: String,
    pub item_table: String,
    pub door_prop: String,
    pub light_prop: String,
}

impl PlanResources {
    pub fn new(raw: Arc<RawMaster>, templates: Arc<TemplateRegistry>) -> Self {
        Self {
            raw,
            templates,
            enemy_table: "enemies".to_string(),
            item_table: "items".to_string(),
            door_prop: "door".to_string(),
            light_prop: "torch".to_string(),
        }
    }
}

impl Default for PlanResources {
    fn default() -> Self {
        Self::new(Arc::new(RawMaster::default()), Arc::new(TemplateRegistry::new()))
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::EnumIter, strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum PlannerType {
    SmallRoom,
    BigRoom,
    Cave,
    Ruins,
    Forest,
    TownPlaza,
    OfficeBuilding,
    SmallTown,
}

impl PlannerType {
    /// Template planners build from chunk files; the rest generate rooms.
    pub fn is_template(self) -> bool {
        matches!(
            self,
            PlannerType::TownPlaza | PlannerType::OfficeBuilding | PlannerType::SmallTown
        )
    }

    /// Chunk expanded by template planners.
    pub fn chunk_name(self) -> Option<&'static str> {
        self.is_template().then(|| self.into())
    }

    pub fn build_chain(self, resources: &PlanResources) -> PlannerChain {
        let chain = match self {
            PlannerType::SmallRoom => PlannerChain::new(RoomsStarter::new(12, 4, 10))
                .with(FillWall)
                .with(RoomDraw::new(TileKind::Floor))
                .with(CorridorConnect),
            PlannerType::BigRoom => PlannerChain::new(BigRoomStarter),
            PlannerType::Cave => PlannerChain::new(CaveStarter::default()),
            PlannerType::Ruins => PlannerChain::new(RuinsStarter::new(8)),
            PlannerType::Forest => PlannerChain::new(ForestStarter::default()),
            PlannerType::TownPlaza | PlannerType::OfficeBuilding | PlannerType::SmallTown => {
                let chunk = self.chunk_name().unwrap_or_default();
                PlannerChain::new(TemplateStarter::new(resources.templates.clone(), chunk))
            }
        };
        let chain = chain
            .with(BridgeWrap::default())
            .with(ConvertIsolatedWalls)
            .with(ExitPlacement);

        if self.is_template() {
            // Chunks carry their own NPCs and props.
            return chain.with(ItemPlacement::new(resources.item_table.clone(), 1, 3));
        }
        chain
            .with(HostileNpc::new(resources.enemy_table.clone(), 3, 6))
            .with(ItemPlacement::new(resources.item_table.clone(), 2, 5))
            .with(PropPlacement::new(
                Some(resources.door_prop.clone()),
                resources.light_prop.clone(),
                4,
            ))
    }
}

/// Runs chains from `build` until one passes the connectivity check.
///
/// Attempt `n` (zero-based) uses `seed + 1000 * n`. Recoverable errors
/// (disconnected floors, no room for the player) retry; the last of them is
/// returned once attempts run out. Integrity errors abort immediately.
pub fn plan_with<F>(seed: u64, level: Level, raw: Arc<RawMaster>, build: F) -> Result<MetaPlan, PlanError>
where
    F: Fn() -> PlannerChain,
{
    let mut last_err = PlanError::Connectivity {
        seed,
        attempts: GameConfig::MAX_PLAN_ATTEMPTS,
    };
    for attempt in 0..GameConfig::MAX_PLAN_ATTEMPTS {
        let attempt_seed = seed.wrapping_add(GameConfig::PLAN_RETRY_SEED_OFFSET * u64::from(attempt));
        let mut plan = MetaPlan::new(level, attempt_seed, raw.clone());
        match build().run(&mut plan) {
            Ok(()) => {}
            Err(err) if err.severity().is_recoverable() => {
                tracing::warn!(seed = attempt_seed, attempt, %err, "floor plan failed, retrying");
                last_err = err;
                continue;
            }
            Err(err) => return Err(err),
        }

        if plan.is_connected() {
            apply_autotile(&plan.level, &mut plan.tiles);
            tracing::debug!(
                seed = attempt_seed,
                attempt,
                rooms = plan.rooms.len(),
                npcs = plan.npc_specs.len(),
                "floor planned"
            );
            return Ok(plan);
        }
        tracing::warn!(seed = attempt_seed, attempt, "disconnected floor, retrying");
        last_err = PlanError::Connectivity {
            seed,
            attempts: GameConfig::MAX_PLAN_ATTEMPTS,
        };
    }
    Err(last_err)
}

/// Plans a floor of `planner` type.
pub fn plan_floor(
    seed: u64,
    planner: PlannerType,
    level: Level,
    resources: &PlanResources,
) -> Result<MetaPlan, PlanError> {
    let mut plan = plan_with(seed, level, resources.raw.clone(), || planner.build_chain(resources))?;
    plan.hints.push(if planner.is_template() {
        PlanHint::Templated
    } else {
        PlanHint::Indoor
    });
    if matches!(
        planner,
        PlannerType::Forest | PlannerType::TownPlaza | PlannerType::SmallTown
    ) {
        plan.hints.push(PlanHint::Outdoor);
    }
    Ok(plan)
}
