use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use crawl_engine::{ApiSettings, EngineSettings, PollSettings};
use engine_logging::engine_info;
use log::LevelFilter;
use serde::Deserialize;

use super::logging::LogDestination;

pub const CONFIG_FILENAME: &str = "crawl_console.ron";

/// Optional overrides read from `crawl_console.ron`. Every field falls back to
/// the engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub base_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub max_poll_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub export_timeout_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub log_destination: Option<LogDestination>,
    pub log_level: Option<String>,
}

impl ConsoleConfig {
    pub fn engine_settings(&self) -> EngineSettings {
        let defaults = EngineSettings::default();
        let api = ApiSettings {
            base_url: self
                .base_url
                .clone()
                .unwrap_or(defaults.api.base_url),
            connect_timeout: self
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.api.connect_timeout),
            request_timeout: self
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.api.request_timeout),
            export_timeout: self
                .export_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.api.export_timeout),
        };
        let poll = PollSettings {
            interval: self
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll.interval),
            max_duration: self
                .max_poll_secs
                .map(Duration::from_secs)
                .or(defaults.poll.max_duration),
        };
        EngineSettings {
            api,
            poll,
            output_dir: self.output_dir.clone().unwrap_or(defaults.output_dir),
        }
    }

    pub fn log_destination(&self) -> LogDestination {
        self.log_destination.unwrap_or_default()
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(LevelFilter::Info)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_ms == Some(0) {
            bail!("poll_interval_ms must be greater than zero");
        }
        if let Some(raw) = self.log_level.as_deref() {
            if raw.parse::<LevelFilter>().is_err() {
                bail!("unknown log_level {raw:?}");
            }
        }
        Ok(())
    }
}

/// Loads the config file; a missing file yields defaults, a broken one is an error.
pub fn load(path: &Path) -> anyhow::Result<ConsoleConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ConsoleConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    let config: ConsoleConfig =
        ron::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))?;
    config.validate()?;
    engine_info!("Loaded console config from {:?}", path);
    Ok(config)
}
