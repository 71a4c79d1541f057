use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// User-tunable settings stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Furthest a row can be swiped, in gesture units
    pub max_swipe_offset: f32,
    /// Swipe distance that deletes on release
    pub swipe_commit_threshold: f32,
    /// Quiet period before a trackpad swipe resolves
    pub swipe_debounce_ms: u64,
    /// Gesture units per terminal column of mouse drag
    pub column_units: f32,
    /// Gesture units per horizontal scroll notch
    pub wheel_step: f32,
    /// Cap on remembered undo steps (unbounded when absent)
    pub undo_limit: Option<usize>,
    /// Event poll interval
    pub tick_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_swipe_offset: 300.0,
            swipe_commit_threshold: 150.0,
            swipe_debounce_ms: 150,
            column_units: 10.0,
            wheel_step: 25.0,
            undo_limit: None,
            tick_ms: crate::ticker::DEFAULT_TICK_MS,
        }
    }
}

impl Config {
    pub fn swipe_debounce(&self) -> Duration {
        Duration::from_millis(self.swipe_debounce_ms)
    }

    /// Clamp obviously broken values instead of refusing to start
    fn sanitized(mut self) -> Self {
        let defaults = Config::default();
        if !(self.max_swipe_offset.is_finite() && self.max_swipe_offset > 0.0) {
            self.max_swipe_offset = defaults.max_swipe_offset;
        }
        if !(self.swipe_commit_threshold.is_finite() && self.swipe_commit_threshold > 0.0) {
            self.swipe_commit_threshold = defaults.swipe_commit_threshold;
        }
        // a threshold beyond the clamp could never be reached
        self.swipe_commit_threshold = self.swipe_commit_threshold.min(self.max_swipe_offset);
        if !(self.column_units.is_finite() && self.column_units > 0.0) {
            self.column_units = defaults.column_units;
        }
        if !(self.wheel_step.is_finite() && self.wheel_step > 0.0) {
            self.wheel_step = defaults.wheel_step;
        }
        if self.tick_ms == 0 {
            self.tick_ms = defaults.tick_ms;
        }
        self
    }
}

/// Load config.json, falling back to defaults when it does not exist
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config: {}", path.display()))?;
    Ok(config.sanitized())
}

/// Save config.json
pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    crate::persistence::atomic_write(path, &json)?;
    Ok(())
}
