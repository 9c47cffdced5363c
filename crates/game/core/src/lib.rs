//! Deterministic simulation core of the Ruins dungeon crawler.
//!
//! `game-core` owns the authoritative world: the entity store, the tile
//! grid, the AP scheduler and its activities, the procedural map pipeline
//! and the visibility engine. It performs no I/O; `game-content` parses data
//! files into the plain values consumed here, and the client drives
//! [`Game::update`] / [`Game::draw_pass`] once per frame.
pub mod activity;
pub mod components;
pub mod config;
pub mod ecs;
pub mod error;
pub mod game;
pub mod gamelog;
pub mod interaction;
pub mod level;
pub mod mapplan;
pub mod movement;
pub mod raw;
pub mod rng;
pub mod sim;
pub mod spawner;
pub mod systems;
pub mod template;
pub mod turns;
pub mod vision;
pub mod weighted;

pub use activity::{Activity, ActivityError, ActivityKind, ActivityManager, ActivityState};
pub use config::GameConfig;
pub use ecs::{Component, Entity, World};
pub use error::{ErrorSeverity, GameError};
pub use game::{FloorError, Game, UpdateReport};
pub use gamelog::GameLog;
pub use level::{Direction, Level, Position, Rect, Tile, TileIdx, TileKind};
pub use mapplan::{MetaPlan, PlanError, PlanResources, PlannerChain, PlannerType, plan_floor};
pub use raw::{RawData, RawError, RawMaster};
pub use rng::GameRng;
pub use sim::{SimContext, Signals, TileGrid};
pub use spawner::{FloorSpawn, SpawnError};
pub use template::{ChunkTemplate, Palette, TemplateError, TemplateRegistry};
pub use turns::{Tick, TurnManager};
pub use vision::VisionState;
