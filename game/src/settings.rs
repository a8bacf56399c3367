use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::tetris_core::MovementPolicy;

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 500;
pub const MIN_TICK_INTERVAL_MS: u64 = 50;
pub const MAX_TICK_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_CELL_SIZE: u32 = 20;
pub const MIN_CELL_SIZE: u32 = 8;
pub const MAX_CELL_SIZE: u32 = 64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VideoSettings {
    pub cell_size: u32,
    pub window_scale: u32,
    pub vsync: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            window_scale: 2,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameplaySettings {
    pub tick_interval_ms: u64,
    pub movement: MovementPolicy,
    /// Restore the save slot at startup.
    pub autoload: bool,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            movement: MovementPolicy::default(),
            autoload: true,
        }
    }
}

impl GameplaySettings {
    pub fn tick_interval(self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub gameplay: GameplaySettings,
    #[serde(default)]
    pub video: VideoSettings,
    #[serde(default)]
    pub save_path: Option<PathBuf>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            gameplay: GameplaySettings::default(),
            video: VideoSettings::default(),
            save_path: None,
        }
    }
}

impl GameSettings {
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self.gameplay.tick_interval_ms = self
            .gameplay
            .tick_interval_ms
            .clamp(MIN_TICK_INTERVAL_MS, MAX_TICK_INTERVAL_MS);
        self.video.cell_size = self.video.cell_size.clamp(MIN_CELL_SIZE, MAX_CELL_SIZE);
        self.video.window_scale = self.video.window_scale.clamp(1, 4);
        self
    }
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        if let Some(explicit) = std::env::var_os("BLOCKFALL_SETTINGS_PATH") {
            return Self::new(explicit);
        }

        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| {
                    let mut p = PathBuf::from(home);
                    p.push(".config");
                    p
                })
            })
            .unwrap_or_else(|| PathBuf::from("."));

        let mut path = base;
        path.push("blockfall");
        path.push("settings.json");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> Option<&Path> {
        self.path.parent()
    }

    pub fn load(&self) -> GameSettings {
        let Ok(bytes) = fs::read(&self.path) else {
            return GameSettings::default();
        };
        serde_json::from_slice::<GameSettings>(&bytes)
            .map(GameSettings::sanitized)
            .unwrap_or_else(|_| GameSettings::default())
    }
}
