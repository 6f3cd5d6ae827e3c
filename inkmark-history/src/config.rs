//! History configuration.
//!
//! Defaults reproduce the plain behaviour: unbounded, one snapshot per mutation,
//! and the first recorded snapshot is the floor for undo.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::HistoryError;

/// File extension recommended for saved history configs.
pub const CONFIG_FILE_EXT: &str = "inkmark.json";

/// What `undo` does once the cursor reaches the first recorded snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndoBoundary {
    /// The first snapshot cannot be undone. `can_undo` is `cursor > 0`.
    #[default]
    KeepFirst,
    /// Undo may step from the first snapshot to the empty state (`-1`),
    /// which clears the canvas instead of restoring a snapshot.
    AllowEmpty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Oldest snapshots are evicted past this many. `None` keeps everything.
    #[serde(default)]
    pub max_states: Option<usize>,

    #[serde(default)]
    pub boundary: UndoBoundary,

    /// Records closer together than this replace the latest snapshot. 0 disables.
    #[serde(default = "default_coalesce_window_ms")]
    pub coalesce_window_ms: u64,
}

fn default_coalesce_window_ms() -> u64 {
    0
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_states: None,
            boundary: UndoBoundary::default(),
            coalesce_window_ms: default_coalesce_window_ms(),
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<(), HistoryError> {
        if self.max_states == Some(0) {
            tracing::error!("history config rejected: max_states is 0");
            return Err(HistoryError::InvalidCapacity);
        }
        Ok(())
    }

    pub fn coalesce_window(&self) -> Option<Duration> {
        match self.coalesce_window_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = Some(max_states);
        self
    }

    pub fn with_boundary(mut self, boundary: UndoBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Sub-millisecond windows round up to 1ms rather than turning coalescing off.
    pub fn with_coalesce_window(mut self, window: Duration) -> Self {
        let ms = window.as_nanos().div_ceil(1_000_000);
        self.coalesce_window_ms = u64::try_from(ms).unwrap_or(u64::MAX);
        self
    }
}

/// Save a config to disk as pretty JSON.
pub fn save_config(path: impl AsRef<Path>, config: &HistoryConfig) -> anyhow::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(config).context("serialize history config to json")?;
    fs::write(path, json).with_context(|| format!("write config file: {}", path.display()))?;
    Ok(())
}

/// Load and validate a config from disk.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<HistoryConfig> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config file: {}", path.display()))?;
    let config: HistoryConfig = serde_json::from_str(&data).context("parse history config json")?;
    config
        .validate()
        .with_context(|| format!("invalid history config: {}", path.display()))?;
    Ok(config)
}
