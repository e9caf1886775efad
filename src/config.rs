// SPDX-License-Identifier: MPL-2.0
//! This module handles the application's configuration, loading and saving
//! user preferences to a `settings.toml` file.
//!
//! All fields are optional in the file; missing or malformed values fall
//! back to defaults so a stale config can never keep the player from
//! starting.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "IcedReel";

/// Seek step applied by the arrow keys, in seconds.
pub const DEFAULT_SEEK_STEP_SECS: f64 = 10.0;
pub const MIN_SEEK_STEP_SECS: f64 = 1.0;
pub const MAX_SEEK_STEP_SECS: f64 = 60.0;

/// Initial audio volume (0.0 to 1.0).
pub const DEFAULT_VOLUME: f32 = 0.8;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Arrow-key seek step in seconds.
    #[serde(default)]
    pub seek_step_secs: Option<f64>,
    /// Initial audio volume (0.0 to 1.0).
    #[serde(default)]
    pub volume: Option<f32>,
    /// When true, key presses already captured by a widget are not routed
    /// to the playback shortcuts. The default leaves them routed, so
    /// shortcuts work no matter where focus sits.
    #[serde(default)]
    pub exclusive_keys: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seek_step_secs: Some(DEFAULT_SEEK_STEP_SECS),
            volume: Some(DEFAULT_VOLUME),
            exclusive_keys: Some(false),
        }
    }
}

impl Config {
    /// Seek step with the configured value clamped to the supported range.
    pub fn seek_step(&self) -> f64 {
        self.seek_step_secs
            .unwrap_or(DEFAULT_SEEK_STEP_SECS)
            .clamp(MIN_SEEK_STEP_SECS, MAX_SEEK_STEP_SECS)
    }

    /// Initial volume clamped to 0.0–1.0.
    pub fn volume(&self) -> f32 {
        self.volume.unwrap_or(DEFAULT_VOLUME).clamp(0.0, 1.0)
    }

    pub fn exclusive_keys(&self) -> bool {
        self.exclusive_keys.unwrap_or(false)
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<Config> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Config::default())
}

pub fn save(config: &Config) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(e) => {
            tracing::warn!("ignoring malformed {}: {}", CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
