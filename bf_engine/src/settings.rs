use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::{Deserialize, Serialize};

use crate::settings::SettingsError::LoadSettingsError;
use crate::DEFAULT_SAMPLE_RATE;

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    IoError(#[from] io::Error),

    #[error("failed to deserialize settings: {message}")]
    LoadSettingsError {
        message: String,
        line: usize,
        column: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub window_size: usize,
    pub hop_size: usize,
    pub threshold: f32,
    pub min_gap_ms: f32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        DetectorSettings {
            window_size: 1024,
            hop_size: 512,
            threshold: 0.3,
            min_gap_ms: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetronomeSettings {
    /// Sound placed on every beat
    pub click: PathBuf,
    pub output: PathBuf,
}

/// Settings of a beat flip run, usually read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Rate everything is resampled to after loading. `None` keeps the input's rate.
    pub sample_rate: Option<u32>,
    /// Shifts the beat grid by this fraction of a beat, for when detection is early or late.
    pub offset_percent: f64,
    /// Trims leading and trailing audio quieter than this many dB below the peak.
    pub trim_top_db: Option<f32>,
    pub detector: DetectorSettings,
    pub metronome: Option<MetronomeSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            input: PathBuf::from("song.wav"),
            output: PathBuf::from("out.wav"),
            sample_rate: Some(DEFAULT_SAMPLE_RATE),
            offset_percent: 0.0,
            trim_top_db: None,
            detector: DetectorSettings::default(),
            metronome: None,
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let serialized = fs::read_to_string(path)?;
        Self::from_json(&serialized)
    }

    pub fn from_json(serialized: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(serialized)
            .map_err(|e| {
                LoadSettingsError {
                    message: e.to_string(),
                    line: e.line(),
                    column: e.column(),
                }
            })
    }
}
