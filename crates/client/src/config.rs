//! Client configuration read from `RUINS_*` environment variables.
//!
//! A profile picks the defaults; every other key overrides one field.
//! Unparseable values are ignored and the profile default is kept.
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use game_core::PlannerType;

/// Deployment profile selecting the defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Profile {
    #[default]
    Production,
    Development,
    Testing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Ignore,
}

impl LogLevel {
    /// `tracing` has no fatal level; it maps to `error`.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error | LogLevel::Fatal => "error",
            LogLevel::Ignore => "off",
        }
    }
}

/// Where a new game begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StartingState {
    Town,
    MainMenu,
}

impl StartingState {
    /// The headless client has no menu, so `main_menu` starts straight in
    /// the dungeon.
    pub fn planner(self) -> PlannerType {
        match self {
            StartingState::Town => PlannerType::TownPlaza,
            StartingState::MainMenu => PlannerType::SmallRoom,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl WindowConfig {
    pub const MIN_WIDTH: u32 = 320;
    pub const MIN_HEIGHT: u32 = 240;
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfilingConfig {
    /// Serve frame counters over HTTP.
    pub enabled: bool,
    pub port: u16,
    /// Log a frame-rate line once per second of frames.
    pub show_monitor: bool,
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 6060,
            show_monitor: false,
        }
    }
}

/// Configuration of the `ruins` binary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub profile: Profile,
    pub window: WindowConfig,
    pub debug: bool,
    pub log_level: LogLevel,
    /// `game_core` module names whose events pass the filter at `log_level`.
    pub log_categories: Vec<String>,
    pub profiling: ProfilingConfig,
    pub show_map_debug: bool,
    pub no_encounter: bool,
    pub starting_state: StartingState,
    pub disable_animation: bool,
    /// Fixed game seed; drawn from entropy when absent.
    pub seed: Option<u64>,
    pub target_fps: u32,
    /// Stop after this many frames.
    pub max_frames: Option<u64>,
    /// Content directory; the bundled data set when absent.
    pub data_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Defaults of one profile.
    pub fn for_profile(profile: Profile) -> Self {
        let base = Self {
            profile,
            window: WindowConfig::default(),
            debug: false,
            log_level: LogLevel::Info,
            log_categories: Vec::new(),
            profiling: ProfilingConfig::default(),
            show_map_debug: false,
            no_encounter: false,
            starting_state: StartingState::Town,
            disable_animation: false,
            seed: None,
            target_fps: 60,
            max_frames: None,
            data_dir: None,
        };

        match profile {
            Profile::Production => base,
            Profile::Development => Self {
                debug: true,
                log_level: LogLevel::Debug,
                profiling: ProfilingConfig {
                    enabled: true,
                    show_monitor: true,
                    ..ProfilingConfig::default()
                },
                show_map_debug: true,
                ..base
            },
            Profile::Testing => Self {
                window: WindowConfig {
                    width: WindowConfig::MIN_WIDTH,
                    height: WindowConfig::MIN_HEIGHT,
                    fullscreen: false,
                },
                log_level: LogLevel::Warn,
                no_encounter: true,
                starting_state: StartingState::MainMenu,
                disable_animation: true,
                seed: Some(1),
                target_fps: 1000,
                max_frames: Some(200),
                ..base
            },
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `RUINS_PROFILE` - `production`, `development` or `testing` (default: production)
    /// - `RUINS_WINDOW_WIDTH`, `RUINS_WINDOW_HEIGHT`, `RUINS_FULLSCREEN`
    /// - `RUINS_DEBUG`
    /// - `RUINS_LOG_LEVEL` - `debug`, `info`, `warn`, `error`, `fatal` or `ignore`
    /// - `RUINS_LOG_CATEGORIES` - comma-separated module names, e.g. `vision,turns`
    /// - `RUINS_DEBUG_PPROF`, `RUINS_PPROF_PORT`, `RUINS_SHOW_MONITOR`
    /// - `RUINS_SHOW_MAP_DEBUG`, `RUINS_NO_ENCOUNTER`
    /// - `RUINS_STARTING_STATE` - `town` or `main_menu`
    /// - `RUINS_DISABLE_ANIMATION`
    /// - `RUINS_SEED`, `RUINS_TARGET_FPS`, `RUINS_MAX_FRAMES`
    /// - `RUINS_DATA_DIR` - content directory (default: bundled data)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] over an arbitrary key source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let profile = read(&lookup, "RUINS_PROFILE").unwrap_or_default();
        let mut config = Self::for_profile(profile);

        if let Some(width) = read(&lookup, "RUINS_WINDOW_WIDTH") {
            config.window.width = width;
        }
        if let Some(height) = read(&lookup, "RUINS_WINDOW_HEIGHT") {
            config.window.height = height;
        }
        if let Some(fullscreen) = read_bool(&lookup, "RUINS_FULLSCREEN") {
            config.window.fullscreen = fullscreen;
        }
        if let Some(debug) = read_bool(&lookup, "RUINS_DEBUG") {
            config.debug = debug;
        }
        if let Some(level) = read(&lookup, "RUINS_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(categories) = lookup("RUINS_LOG_CATEGORIES") {
            config.log_categories = categories
                .split(',')
                .map(str::trim)
                .filter(|category| !category.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(enabled) = read_bool(&lookup, "RUINS_DEBUG_PPROF") {
            config.profiling.enabled = enabled;
        }
        if let Some(port) = read(&lookup, "RUINS_PPROF_PORT") {
            config.profiling.port = port;
        }
        if let Some(show) = read_bool(&lookup, "RUINS_SHOW_MONITOR") {
            config.profiling.show_monitor = show;
        }
        if let Some(show) = read_bool(&lookup, "RUINS_SHOW_MAP_DEBUG") {
            config.show_map_debug = show;
        }
        if let Some(disabled) = read_bool(&lookup, "RUINS_NO_ENCOUNTER") {
            config.no_encounter = disabled;
        }
        if let Some(state) = read(&lookup, "RUINS_STARTING_STATE") {
            config.starting_state = state;
        }
        if let Some(disabled) = read_bool(&lookup, "RUINS_DISABLE_ANIMATION") {
            config.disable_animation = disabled;
        }
        if let Some(seed) = read(&lookup, "RUINS_SEED") {
            config.seed = Some(seed);
        }
        if let Some(fps) = read(&lookup, "RUINS_TARGET_FPS") {
            config.target_fps = fps;
        }
        if let Some(frames) = read(&lookup, "RUINS_MAX_FRAMES") {
            config.max_frames = Some(frames);
        }
        if let Some(dir) = lookup("RUINS_DATA_DIR").filter(|dir| !dir.is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }

        config.validate();
        config
    }

    /// Clamps values the frame loop cannot run with.
    pub fn validate(&mut self) {
        self.window.width = self.window.width.max(WindowConfig::MIN_WIDTH);
        self.window.height = self.window.height.max(WindowConfig::MIN_HEIGHT);
        self.target_fps = self.target_fps.max(1);
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }

    pub fn planner(&self) -> PlannerType {
        self.starting_state.planner()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_profile(Profile::default())
    }
}

fn read<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
{
    lookup(key)?.trim().parse().ok()
}

/// Accepts `true/false`, `1/0`, `yes/no` and `on/off`.
fn read_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    match lookup(key)?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_is_production() {
        let config = from_pairs(&[]);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.profile, Profile::Production);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(!config.profiling.enabled);
    }

    #[test]
    fn profile_selects_defaults() {
        let dev = from_pairs(&[("RUINS_PROFILE", "development")]);
        assert!(dev.debug);
        assert!(dev.profiling.enabled);
        assert_eq!(dev.log_level, LogLevel::Debug);

        let testing = from_pairs(&[("RUINS_PROFILE", "Testing")]);
        assert_eq!(testing.seed, Some(1));
        assert!(testing.no_encounter);
        assert_eq!(testing.planner(), PlannerType::SmallRoom);
    }

    #[test]
    fn keys_override_profile_defaults() {
        let config = from_pairs(&[
            ("RUINS_PROFILE", "testing"),
            ("RUINS_SEED", "99"),
            ("RUINS_LOG_LEVEL", "fatal"),
            ("RUINS_LOG_CATEGORIES", "vision, turns,"),
            ("RUINS_STARTING_STATE", "town"),
            ("RUINS_NO_ENCOUNTER", "off"),
            ("RUINS_PPROF_PORT", "7070"),
        ]);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.log_level.directive(), "error");
        assert_eq!(config.log_categories, vec!["vision".to_string(), "turns".to_string()]);
        assert_eq!(config.planner(), PlannerType::TownPlaza);
        assert!(!config.no_encounter);
        assert_eq!(config.profiling.port, 7070);
    }

    #[test]
    fn validation_clamps_window_and_fps() {
        let config = from_pairs(&[
            ("RUINS_WINDOW_WIDTH", "100"),
            ("RUINS_WINDOW_HEIGHT", "10"),
            ("RUINS_TARGET_FPS", "0"),
        ]);
        assert_eq!((config.window.width, config.window.height), (320, 240));
        assert_eq!(config.target_fps, 1);
        assert_eq!(config.frame_interval(), Duration::from_secs(1));
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = from_pairs(&[("RUINS_TARGET_FPS", "fast"), ("RUINS_FULLSCREEN", "maybe"), ("RUINS_PROFILE", "staging")]);
        assert_eq!(config.target_fps, 60);
        assert!(!config.window.fullscreen);
        assert_eq!(config.profile, Profile::Production);
    }
}
