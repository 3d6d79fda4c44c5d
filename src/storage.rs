//! Persisted user settings, high score and lifetime stats
//!
//! Everything lives in one JSON file under the platform config directory.
//! A missing file yields defaults; an unreadable or corrupt one is logged and
//! replaced with defaults rather than failing the game.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::game::GameOverSummary;

const FILE_NAME: &str = "save.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedSetting {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl SpeedSetting {
    /// Multiplier applied to the player's base speed
    pub fn factor(&self) -> f32 {
        match self {
            SpeedSetting::Slow => 0.8,
            SpeedSetting::Medium => 1.0,
            SpeedSetting::Fast => 4.0 / 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Neon,
    Retro,
}

/// Which keys steer the snake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlScheme {
    #[default]
    Arrows,
    Wasd,
    Both,
}

impl ControlScheme {
    pub fn arrows(&self) -> bool {
        matches!(self, ControlScheme::Arrows | ControlScheme::Both)
    }

    pub fn wasd(&self) -> bool {
        matches!(self, ControlScheme::Wasd | ControlScheme::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub speed: SpeedSetting,
    pub theme: Theme,
    pub controls: ControlScheme,
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: SpeedSetting::default(),
            theme: Theme::default(),
            controls: ControlScheme::default(),
            sound_enabled: true,
        }
    }
}

/// Totals across every finished round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub games_played: u32,
    pub total_score: u64,
    /// Longest round, in seconds
    pub best_time: f32,
    pub longest_snake: usize,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            games_played: 0,
            total_score: 0,
            best_time: 0.0,
            longest_snake: 1,
        }
    }
}

impl Stats {
    pub fn record(&mut self, summary: &GameOverSummary) {
        self.games_played += 1;
        self.total_score += summary.score as u64;
        if summary.snake_length > self.longest_snake {
            self.longest_snake = summary.snake_length;
        }
        if summary.elapsed_time.is_finite() && summary.elapsed_time > self.best_time {
            self.best_time = summary.elapsed_time;
        }
    }
}

/// Contents of the save file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveData {
    pub settings: Settings,
    pub high_score: u32,
    pub stats: Stats,
}

impl SaveData {
    /// Raise the high score if beaten. Returns whether it was.
    pub fn submit_score(&mut self, score: u32) -> bool {
        if score > self.high_score {
            self.high_score = score;
            true
        } else {
            false
        }
    }

    /// Fold a finished round into the stats and high score
    pub fn record_game(&mut self, summary: &GameOverSummary) -> bool {
        self.stats.record(summary);
        self.submit_score(summary.score)
    }
}

/// Reads and writes [`SaveData`] at a fixed path
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the platform config directory
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join("slither_snake");
        Ok(Self::new(dir.join(FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load, falling back to defaults when the file is missing or corrupt
    pub fn load(&self) -> SaveData {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No save file yet, using defaults");
            return SaveData::default();
        }
        match self.try_load() {
            Ok(data) => data,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %format!("{err:#}"),
                    "Ignoring unreadable save file"
                );
                SaveData::default()
            }
        }
    }

    fn try_load(&self) -> Result<SaveData> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read save file {:?}", self.path))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse save file {:?}", self.path))
    }

    pub fn save(&self, data: &SaveData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(data).context("Failed to serialize save data")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write save file {:?}", self.path))?;
        debug!(path = %self.path.display(), "Saved settings and stats");
        Ok(())
    }
}
