//! Configuration loading for keyrate.
//!
//! Settings come from `~/.keyrate/config.toml` (or the file named by
//! `KEYRATE_CONFIG`), then environment overrides are applied on top:
//!
//! ```toml
//! [pacing]
//! interval_ms = 1000
//! max_emitters = 16
//!
//! [log]
//! filter = "keyrate=debug"
//! ```
//!
//! A missing file is not an error; every field has a default.

use std::env;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use keyrate_types::{DEFAULT_KEY_RATE, KeyRate, PacerSettings, SettingsError};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "KEYRATE_CONFIG";
pub const INTERVAL_ENV: &str = "KEYRATE_INTERVAL_MS";
pub const MAX_EMITTERS_ENV: &str = "KEYRATE_MAX_EMITTERS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl ConfigError {
    /// The config file involved, for read and parse failures.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => Some(path),
            Self::Invalid { .. } | Self::Settings(_) => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct KeyRateConfig {
    pub pacing: Option<PacingConfig>,
    pub log: Option<LogConfig>,
}

/// ```toml
/// [pacing]
/// interval_ms = 10
/// max_emitters = 2
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct PacingConfig {
    /// Minimum gap between values sharing a key. Default: 1000.
    pub interval_ms: Option<u64>,
    /// Cap on concurrently emitting groups. Default: unlimited.
    pub max_emitters: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

impl KeyRateConfig {
    /// Load the config file, if any. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        Self::load_from(&path)
    }

    /// Load the config file (or defaults) and apply environment overrides.
    pub fn load_with_env() -> Result<Self, ConfigError> {
        let mut config = Self::load()?.unwrap_or_default();
        config.apply_env_overrides(|name| env::var(name).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "Loaded config");
                Ok(Some(config))
            }
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    /// Apply `KEYRATE_*` overrides. `lookup` resolves a variable name to its
    /// value; pass `|name| std::env::var(name).ok()` for the real environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval = parse_env::<u64>(&lookup, INTERVAL_ENV)?;
        let max_emitters = parse_env::<usize>(&lookup, MAX_EMITTERS_ENV)?;

        if interval.is_none() && max_emitters.is_none() {
            return Ok(());
        }

        let pacing = self.pacing.get_or_insert_with(PacingConfig::default);
        if interval.is_some() {
            pacing.interval_ms = interval;
        }
        if max_emitters.is_some() {
            pacing.max_emitters = max_emitters;
        }
        Ok(())
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.pacing
            .as_ref()
            .and_then(|p| p.interval_ms)
            .map_or(DEFAULT_KEY_RATE, Duration::from_millis)
    }

    /// A fresh [`KeyRate`] handle holding the configured interval.
    #[must_use]
    pub fn key_rate(&self) -> KeyRate {
        KeyRate::new(self.interval())
    }

    pub fn pacer_settings(&self) -> Result<PacerSettings, ConfigError> {
        let max_emitters = self.pacing.as_ref().and_then(|p| p.max_emitters);
        PacerSettings::new(max_emitters).map_err(ConfigError::from)
    }

    #[must_use]
    pub fn log_filter(&self) -> Option<&str> {
        self.log.as_ref().and_then(|l| l.filter.as_deref())
    }
}

fn parse_env<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::Invalid {
            field: name,
            reason: format!("{raw:?}: {e}"),
        })
}

/// `$KEYRATE_CONFIG` if set, otherwise `~/.keyrate/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".keyrate").join("config.toml"))
}
