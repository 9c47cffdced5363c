//! Headless frame loop: one update pass then one draw pass per frame.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use game_content::{ContentFactory, bundled_data_dir};
use game_core::components::Player;
use game_core::movement::{can_move_to, character_at, position_of};
use game_core::rng::derive_seed;
use game_core::{Activity, Direction, Game, GameRng, Position, TileKind};
use tokio::time::MissedTickBehavior;

use crate::config::AppConfig;
use crate::profiling::FrameCounters;

/// Seed context of the autopilot stream; the core uses 1 and 2.
const PILOT_SEED_CONTEXT: u32 = 3;

/// Stand-in for the input layer: wanders the player around.
#[derive(Debug)]
pub struct Autopilot {
    rng: GameRng,
}

impl Autopilot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: GameRng::new(derive_seed(seed, 0, PILOT_SEED_CONTEXT)),
        }
    }

    /// Queues the next player activity when the player is idle.
    pub fn drive(&mut self, game: &mut Game) {
        let player = game.player();
        if game.is_over() || game.activities().has_activity(player) {
            return;
        }
        let activity = self.pick(game).unwrap_or_else(|| Activity::wait(player));
        if let Err(err) = game.submit(activity) {
            tracing::debug!(%err, "autopilot activity rejected");
            if let Err(err) = game.submit(Activity::wait(player)) {
                tracing::debug!(%err, "autopilot wait rejected");
            }
        }
    }

    fn pick(&mut self, game: &Game) -> Option<Activity> {
        let player = game.player();
        let here = position_of(game.world(), player)?;
        let mut directions = Direction::ALL;
        self.rng.shuffle(&mut directions);
        for direction in directions {
            let next = here.step(direction);
            if let Some(other) = character_at(game.world(), next).filter(|&other| other != player) {
                return Some(Activity::attack(player, other));
            }
            if can_move_to(game.world(), game.grid(), next, player) {
                return Some(Activity::move_to(player, next));
            }
        }
        None
    }
}

/// Why the loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    PlayerDied,
    Escaped,
    FrameLimit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub depth: u32,
    pub outcome: Outcome,
}

pub struct App {
    config: AppConfig,
    game: Game,
    pilot: Autopilot,
    counters: Arc<FrameCounters>,
    frames: u64,
}

impl App {
    /// Loads content and builds the first floor.
    pub fn new(config: AppConfig, counters: Arc<FrameCounters>) -> Result<Self> {
        let data_dir = config.data_dir.clone().unwrap_or_else(bundled_data_dir);
        let factory = ContentFactory::new(&data_dir);
        let game_config = factory.load_config()?;
        let mut resources = factory
            .load_resources()
            .with_context(|| format!("failed to load content from {}", data_dir.display()))?;
        if config.no_encounter {
            tracing::info!("encounters disabled");
            resources.enemy_table.clear();
        }

        let seed = config.seed.unwrap_or_else(|| GameRng::from_entropy().next_u64());
        let game = Game::new(game_config, resources, seed, config.planner()).context("failed to build the first floor")?;
        tracing::info!(seed, planner = %game.planner(), "game ready");

        let app = Self {
            pilot: Autopilot::new(seed),
            config,
            game,
            counters,
            frames: 0,
        };
        app.dump_map();
        Ok(app)
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs one frame: input, update pass, draw pass.
    pub fn frame(&mut self) -> Result<Outcome> {
        let started = Instant::now();
        self.pilot.drive(&mut self.game);
        let report = self.game.update()?;
        let vision_updated = self.game.draw_pass();
        self.frames += 1;
        self.counters.record_frame(&report, vision_updated, started.elapsed());

        if let Some(depth) = report.descended_to {
            tracing::info!(depth, "new floor");
            self.dump_map();
        }
        let outcome = if self.game.has_escaped() {
            Outcome::Escaped
        } else if report.deaths.player_died || self.game.is_over() {
            Outcome::PlayerDied
        } else if self.config.max_frames.is_some_and(|max| self.frames >= max) {
            Outcome::FrameLimit
        } else {
            Outcome::Continue
        };
        Ok(outcome)
    }

    /// Runs frames at the target rate until the game ends.
    pub async fn run(mut self) -> Result<RunSummary> {
        let mut interval = tokio::time::interval(self.config.frame_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let monitor_every = u64::from(self.config.target_fps);

        let outcome = loop {
            interval.tick().await;
            let outcome = self.frame()?;
            if self.config.profiling.show_monitor && self.frames % monitor_every == 0 {
                let snapshot = self.counters.snapshot();
                tracing::info!(
                    frames = snapshot.frames,
                    ticks = snapshot.ticks,
                    frame_us = snapshot.last_frame_micros,
                    "monitor"
                );
            }
            if outcome != Outcome::Continue {
                break outcome;
            }
        };

        for line in self.game.log().lines() {
            tracing::info!(target: "ruins_client::field", "{line}");
        }
        let summary = RunSummary {
            frames: self.frames,
            depth: self.game.depth(),
            outcome,
        };
        tracing::info!(?summary, "run finished");
        Ok(summary)
    }

    fn dump_map(&self) {
        if self.config.show_map_debug {
            tracing::debug!(target: "ruins_client::map", "\n{}", render_map(&self.game));
        }
    }
}

/// ASCII view of the current floor: terrain, characters and the player.
pub fn render_map(game: &Game) -> String {
    let grid = game.grid();
    let world = game.world();
    let mut out = String::with_capacity(grid.tiles.len() + grid.level.height as usize);
    for y in 0..grid.level.height {
        for x in 0..grid.level.width {
            let position = Position::new(x, y);
            let glyph = match character_at(world, position) {
                Some(entity) if world.has::<Player>(entity) => '@',
                Some(_) => 'n',
                None => terrain_glyph(grid.tile_at(position).kind),
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

fn terrain_glyph(kind: TileKind) -> char {
    match kind {
        TileKind::Floor => '.',
        TileKind::Wall => '#',
        TileKind::Dirt => ',',
        TileKind::Water => '~',
        TileKind::Bridge => '=',
        TileKind::Void | TileKind::Empty => ' ',
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Profile;

    use super::*;

    fn testing_app() -> App {
        let config = AppConfig::for_profile(Profile::Testing);
        App::new(config, FrameCounters::new()).unwrap()
    }

    #[test]
    fn testing_profile_builds_a_quiet_floor() {
        let app = testing_app();
        assert!(app.game().floor().npcs.is_empty());
        let map = render_map(app.game());
        assert_eq!(map.matches('@').count(), 1);
        assert_eq!(map.lines().count(), app.game().grid().level.height as usize);
    }

    #[test]
    fn frames_advance_the_simulation() {
        let mut app = testing_app();
        let counters = app.counters.clone();
        for _ in 0..10 {
            assert_eq!(app.frame().unwrap(), Outcome::Continue);
        }
        assert_eq!(app.frames(), 10);
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.frames, 10);
        assert!(snapshot.ticks >= 10);
        assert!(!app.game().vision().explored().is_empty());
    }

    #[tokio::test]
    async fn run_stops_at_frame_limit() {
        let mut config = AppConfig::for_profile(Profile::Testing);
        config.max_frames = Some(5);
        let summary = App::new(config, FrameCounters::new()).unwrap().run().await.unwrap();
        assert_eq!(summary.frames, 5);
        assert_eq!(summary.outcome, Outcome::FrameLimit);
    }
}
