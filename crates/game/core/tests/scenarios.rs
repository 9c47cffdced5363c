//! End-to-end behaviour across the scheduler, planners and vision.

use std::collections::HashMap;
use std::sync::Arc;

use game_core::activity::{Activity, ActivityManager, ActivityState};
use game_core::components::{
    BlockPass, BlockView, Door, DoorOrientation, GridElement, LightSource, Name, Player, Pool, Pools, Rgba,
    TurnBased,
};
use game_core::mapplan::{InitialMapPlanner, MetaMapPlanner, MetaPlan, PlanError, PlannerChain, plan_with};
use game_core::raw::{RawEntry, RawTable};
use game_core::{
    Entity, GameConfig, GameLog, GameRng, Level, PlanResources, PlannerType, Position, RawMaster, Signals,
    SimContext, Tile, TileGrid, TurnManager, VisionState, World, plan_floor,
};

fn player(world: &mut World, at: Position, ap: i32) -> Entity {
    let player = world.spawn();
    world.insert(player, Player);
    world.insert(player, Name::new("you"));
    world.insert(player, GridElement::from(at));
    world.insert(player, TurnBased::new(ap));
    player
}

#[test]
fn same_seed_produces_identical_plans() {
    let resources = PlanResources::default();
    let level = Level::new(50, 50);
    let first = plan_floor(42, PlannerType::SmallRoom, level, &resources).unwrap();
    let second = plan_floor(42, PlannerType::SmallRoom, level, &resources).unwrap();

    assert_eq!(first.tiles, second.tiles);
    assert_eq!(first.rooms, second.rooms);
    let positions = |plan: &MetaPlan| plan.npc_specs.iter().map(|s| s.position).collect::<Vec<_>>();
    assert_eq!(positions(&first), positions(&second));
}

/// Carves a single vertical corridor, broken in the middle when the seed is 100.
struct BrokenAtHundred;

impl InitialMapPlanner for BrokenAtHundred {
    fn name(&self) -> &'static str {
        "broken_at_hundred"
    }

    fn plan_initial(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        plan.fill(Tile::wall());
        let gap = if plan.seed == 100 { Some(plan.level.height / 2) } else { None };
        for y in 0..plan.level.height {
            if Some(y) != gap {
                plan.set_tile(Position::new(3, y), Tile::floor());
            }
        }
        Ok(())
    }
}

struct SeedLog(Arc<std::sync::Mutex<Vec<u64>>>);

impl MetaMapPlanner for SeedLog {
    fn name(&self) -> &'static str {
        "seed_log"
    }

    fn plan_meta(&self, plan: &mut MetaPlan) -> Result<(), PlanError> {
        if let Ok(mut seeds) = self.0.lock() {
            seeds.push(plan.seed);
        }
        Ok(())
    }
}

#[test]
fn disconnected_map_is_retried_with_offset_seed() {
    let seeds = Arc::new(std::sync::Mutex::new(Vec::new()));
    let plan = plan_with(100, Level::new(8, 12), Arc::new(RawMaster::default()), || {
        PlannerChain::new(BrokenAtHundred).with(SeedLog(seeds.clone()))
    })
    .unwrap();

    assert_eq!(*seeds.lock().unwrap(), vec![100, 1100]);
    assert_eq!(plan.seed, 1100);
    assert!(plan.is_connected());
}

#[test]
fn opening_a_door_reveals_the_tile_behind_it() {
    let mut grid = TileGrid::filled(Level::new(20, 20), Tile::floor());
    grid.set(Position::new(12, 10), Tile::wall());

    let mut world = World::new();
    let hero = player(&mut world, Position::new(10, 10), 100);
    let door = world.spawn();
    world.insert(door, GridElement::new(11, 10));
    world.insert(
        door,
        Door {
            is_open: false,
            orientation: DoorOrientation::Vertical,
        },
    );
    world.insert(door, BlockPass);
    world.insert(door, BlockView);

    let mut vision = VisionState::new(GameConfig::DEFAULT_VISION_RADIUS);
    assert!(vision.update_for_player(&world, &grid));
    assert!(!vision.is_visible(Position::new(12, 10)));

    let config = GameConfig::default();
    let mut log = GameLog::default();
    let mut signals = Signals::default();
    let mut activities = ActivityManager::new();
    let mut turns = TurnManager::new();
    {
        let mut ctx = SimContext::new(&mut world, &grid, &mut log, &mut signals, &config);
        activities.submit(Activity::open_door(hero, door), &ctx).unwrap();
        let report = turns.tick(&mut activities, &mut ctx);
        assert_eq!(report.advanced, vec![(hero, ActivityState::Complete)]);
    }
    assert!(signals.force_vision_update);
    assert!(world.get::<Door>(door).unwrap().is_open);

    vision.request_force_update();
    assert!(vision.update_for_player(&world, &grid));
    assert!(vision.is_visible(Position::new(12, 10)));
}

#[test]
fn cancelled_rest_keeps_only_paid_turns() {
    let grid = TileGrid::filled(Level::new(4, 4), Tile::floor());
    let mut world = World::new();
    let hero = player(&mut world, Position::new(1, 1), 500);
    world.insert(
        hero,
        Pools {
            hp: Pool::new(1, 20),
            ..Default::default()
        },
    );

    let config = GameConfig::default().with_ap_recovery(0);
    let mut log = GameLog::default();
    let mut signals = Signals::default();
    let mut ctx = SimContext::new(&mut world, &grid, &mut log, &mut signals, &config);
    let mut activities = ActivityManager::new();
    let mut turns = TurnManager::new();

    activities.submit(Activity::rest(hero, 3), &ctx).unwrap();
    assert_eq!(activities.get(hero).unwrap().total_ap_required, 300);
    turns.tick(&mut activities, &mut ctx);
    turns.tick(&mut activities, &mut ctx);
    assert_eq!(activities.get(hero).unwrap().ap_spent, 200);

    activities.cancel(hero, "a noise").unwrap();
    turns.tick(&mut activities, &mut ctx);

    let ended = activities.last_ended(hero).unwrap();
    assert_eq!(ended.state(), ActivityState::Cancelled);
    assert_eq!(ended.hook_calls().canceled, 1);
    assert_eq!(ended.cancel_reason.as_deref(), Some("a noise"));
    assert_eq!(ctx.world.get::<TurnBased>(hero).unwrap().ap.current(), 300);
}

#[test]
fn enemy_table_frequencies_follow_weights() {
    let table = RawTable {
        name: "enemies".into(),
        entries: vec![
            RawEntry::new("slime", 1.2),
            RawEntry::new("fireball", 1.0),
            RawEntry::new("tank", 0.8),
        ],
    };
    let mut rng = GameRng::new(12345);
    let mut counts: HashMap<String, u32> = HashMap::new();
    const DRAWS: u32 = 10_000;
    for _ in 0..DRAWS {
        let name = table.choose(&mut rng).unwrap();
        *counts.entry(name.to_string()).or_default() += 1;
    }

    for (name, weight) in [("slime", 1.2), ("fireball", 1.0), ("tank", 0.8)] {
        let seen = counts.get(name).copied().unwrap_or(0);
        assert!(seen > 0, "{name} never drawn");
        let frequency = f64::from(seen) / f64::from(DRAWS);
        let expected = weight / 3.0;
        assert!(
            (frequency - expected).abs() < 0.05,
            "{name}: {frequency} vs {expected}"
        );
    }
}

#[test]
fn explored_tiles_follow_the_walk_and_reset_on_clear() {
    let level = Level::new(20, 11);
    let mut grid = TileGrid::filled(level, Tile::wall());
    for x in 1..19 {
        grid.set(Position::new(x, 5), Tile::floor());
    }

    let mut world = World::new();
    let hero = player(&mut world, Position::new(5, 5), 100);
    world.insert(hero, LightSource::new(6, Rgba::new(255, 200, 150, 255)));

    let config = GameConfig::default().with_ap_recovery(100);
    let mut log = GameLog::default();
    let mut signals = Signals::default();
    let mut activities = ActivityManager::new();
    let mut turns = TurnManager::new();
    let mut vision = VisionState::new(GameConfig::DEFAULT_VISION_RADIUS);
    vision.update_for_player(&world, &grid);

    for x in 6..=10 {
        {
            let mut ctx = SimContext::new(&mut world, &grid, &mut log, &mut signals, &config);
            activities
                .submit(Activity::move_to(hero, Position::new(x, 5)), &ctx)
                .unwrap();
            turns.tick(&mut activities, &mut ctx);
        }
        assert_eq!(
            world.get::<GridElement>(hero).unwrap().position(),
            Position::new(x, 5)
        );
        assert!(vision.update_for_player(&world, &grid));

        let here = Position::new(x, 5);
        for cx in 1..19 {
            let tile = Position::new(cx, 5);
            if tile.euclidean(here) <= 6.0 {
                assert!(vision.is_explored(tile), "{tile} unexplored with player at {here}");
            }
        }
    }
    // Everything the walk lit stays remembered.
    for cx in 1..=16 {
        assert!(vision.is_explored(Position::new(cx, 5)));
    }
    assert!(!vision.is_explored(Position::new(5, 9)));

    vision.clear_vision_caches();
    assert!(vision.explored().is_empty());
    assert_eq!(vision.ray_cache_len(), 0);
}
