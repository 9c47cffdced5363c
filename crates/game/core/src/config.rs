/// Game configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    /// Radius (in tiles) of the player's field of view.
    pub vision_radius: i32,
    /// AP regenerated by every live actor per scheduler tick.
    pub ap_recovery: i32,
    /// Hunger consumed by every AP-spending action of a player.
    pub hunger_per_action: i32,
    /// Radius within which AI actors notice the player.
    pub ai_sight_radius: i32,
    /// Default map size for randomised planners.
    pub map_width: i32,
    pub map_height: i32,
}

impl GameConfig {
    // ===== compile-time constants =====
    /// Pixel size of one tile; vision caches are keyed in pixel space.
    pub const TILE_SIZE: i32 = 32;
    /// Raycast memo quantisation step in pixels.
    pub const RAY_CACHE_QUANTUM: i32 = 4;
    /// Raycast memo capacity; inserts beyond it are dropped.
    pub const RAY_CACHE_CAPACITY: usize = 15_000;
    /// Map generation attempts before connectivity failure is surfaced.
    pub const MAX_PLAN_ATTEMPTS: u32 = 10;
    /// Seed offset applied per connectivity retry.
    pub const PLAN_RETRY_SEED_OFFSET: u64 = 1000;
    /// Random placement attempts for a single entity.
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 200;
    /// Maximum nesting of chunk templates.
    pub const MAX_TEMPLATE_DEPTH: usize = 10;
    /// Field log capacity.
    pub const FIELD_LOG_CAPACITY: usize = 64;
    /// Cheapest AP-consuming action; actors below it stay idle.
    pub const CHEAPEST_ACTION_COST: i32 = 50;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_VISION_RADIUS: i32 = 16;
    pub const DEFAULT_AP_RECOVERY: i32 = 40;
    pub const DEFAULT_HUNGER_PER_ACTION: i32 = 1;
    pub const DEFAULT_AI_SIGHT_RADIUS: i32 = 8;
    pub const DEFAULT_MAP_SIZE: i32 = 50;

    pub fn new() -> Self {
        Self {
            vision_radius: Self::DEFAULT_VISION_RADIUS,
            ap_recovery: Self::DEFAULT_AP_RECOVERY,
            hunger_per_action: Self::DEFAULT_HUNGER_PER_ACTION,
            ai_sight_radius: Self::DEFAULT_AI_SIGHT_RADIUS,
            map_width: Self::DEFAULT_MAP_SIZE,
            map_height: Self::DEFAULT_MAP_SIZE,
        }
    }

    pub fn with_ap_recovery(mut self, ap_recovery: i32) -> Self {
        self.ap_recovery = ap_recovery;
        self
    }

    pub fn with_vision_radius(mut self, vision_radius: i32) -> Self {
        self.vision_radius = vision_radius;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
