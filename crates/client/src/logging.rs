//! Tracing setup: stderr plus a log file under the platform cache directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, LogLevel};

/// Platform log directory, e.g. `~/.cache/ruins/logs` on Linux.
pub fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "ruins")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("ruins"))
        .join("logs")
}

/// Filter directives for a level and an optional category list.
///
/// With categories, only the named `game_core` modules and the client itself
/// log at `level`; everything else is limited to warnings.
pub fn filter_directives(level: LogLevel, categories: &[String]) -> String {
    let level = level.directive();
    if categories.is_empty() || level == "off" {
        return level.to_string();
    }
    let mut directives = vec!["warn".to_string(), format!("ruins_client={level}")];
    directives.extend(categories.iter().map(|category| format!("game_core::{category}={level}")));
    directives.join(",")
}

/// Installs the global subscriber. `RUST_LOG` wins over the `RUINS_*` keys.
///
/// The returned guard flushes the file writer on drop and must live until
/// shutdown.
pub fn setup_logging(config: &AppConfig) -> Result<WorkerGuard> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir).with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&dir, "ruins.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config.log_level, &config.log_categories)));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.debug);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    tracing::info!(profile = %config.profile, "logging initialized");
    tracing::info!("log file: {}/ruins.log", dir.display());
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_level_without_categories() {
        assert_eq!(filter_directives(LogLevel::Debug, &[]), "debug");
        assert_eq!(filter_directives(LogLevel::Ignore, &["vision".into()]), "off");
    }

    #[test]
    fn categories_scope_the_level() {
        let directives = filter_directives(LogLevel::Info, &["vision".into(), "turns".into()]);
        assert_eq!(directives, "warn,ruins_client=info,game_core::vision=info,game_core::turns=info");
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn log_dir_ends_in_logs() {
        assert!(log_dir().ends_with("logs"));
    }
}
