//! Ruins game client.
//!
//! Composition root for the headless `ruins` binary:
//! - [`config`]: `RUINS_*` environment configuration and profiles
//! - [`logging`]: tracing subscriber setup
//! - [`app`]: content loading and the frame loop
//! - [`profiling`]: frame counters and their HTTP endpoint

pub mod app;
pub mod config;
pub mod logging;
pub mod profiling;

pub use app::{App, Autopilot, Outcome, RunSummary, render_map};
pub use config::{AppConfig, LogLevel, Profile, StartingState};
pub use profiling::{CounterSnapshot, FrameCounters};
