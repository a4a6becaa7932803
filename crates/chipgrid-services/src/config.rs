//! Editor configuration stored as TOML in the user's config directory

use std::path::PathBuf;

use chipgrid_core::{Song, SoundSource, DEFAULT_STEPS, MAX_STEPS};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub song: SongConfig,
    #[serde(default)]
    pub edit: EditConfig,
}

/// Layout of newly created songs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongConfig {
    pub default_pattern_size: usize,
    pub tracks: Vec<SoundSource>,
}

impl Default for SongConfig {
    fn default() -> Self {
        // FM x6, SSG x3, rhythm, ADPCM
        let mut tracks = vec![SoundSource::Fm; 6];
        tracks.extend([SoundSource::Ssg; 3]);
        tracks.push(SoundSource::Drum);
        tracks.push(SoundSource::Adpcm);
        Self {
            default_pattern_size: DEFAULT_STEPS,
            tracks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    /// Instruments left untouched by transpose commands
    pub transpose_excluded_instruments: Vec<u8>,
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chipgrid")
        .join("config.toml")
}

pub fn parse_config(text: &str) -> Result<TrackerConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

/// Load the user's config, falling back to defaults when missing or invalid
pub fn load_config() -> TrackerConfig {
    let path = config_path();
    let Ok(text) = std::fs::read_to_string(&path) else {
        return TrackerConfig::default();
    };
    match parse_config(&text) {
        Ok(config) => {
            info!(path = %path.display(), "Config loaded");
            config
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
            TrackerConfig::default()
        }
    }
}

pub fn save_config(config: &TrackerConfig) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(config)?)?;
    Ok(())
}

/// Build an empty song laid out as configured
pub fn new_song(config: &TrackerConfig, title: impl Into<String>) -> Song {
    let song_config = &config.song;
    let size = song_config.default_pattern_size.clamp(1, MAX_STEPS);
    if size != song_config.default_pattern_size {
        warn!(
            configured = song_config.default_pattern_size,
            used = size,
            "Pattern size out of range"
        );
    }
    let tracks = if song_config.tracks.is_empty() {
        SongConfig::default().tracks
    } else {
        song_config.tracks.clone()
    };
    Song::new(title, &tracks, size)
}
