use std::path::PathBuf;

use tracing::info;

use crate::resample::resample;
use crate::wav::{self, WavError};
use crate::Time;

/// Sample rate assumed for in-memory buffers that don't specify one.
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

/// Where the samples of an [`AudioSource`] come from.
#[derive(Debug, Clone)]
pub enum SourceInit {
    /// Decode a WAV file. If `sample_rate` is set, the decoded audio is resampled to it.
    FromFile {
        path: PathBuf,
        sample_rate: Option<u32>,
    },

    /// Wrap already decoded mono samples, at [`DEFAULT_SAMPLE_RATE`] unless given.
    FromBuffer {
        samples: Vec<f32>,
        sample_rate: Option<u32>,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("audio source contains no samples")]
    Empty,

    #[error(transparent)]
    Wav(#[from] WavError),
}

/// An immutable chunk of single channel, f32 audio. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSource {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSource {
    pub fn new(init: SourceInit) -> Result<Self, SourceError> {
        match init {
            SourceInit::FromFile { path, sample_rate } => {
                let (samples, native_rate) = wav::read(&path)?;
                info!("loaded {} ({} samples @ {} Hz)", path.display(), samples.len(), native_rate);

                match sample_rate {
                    Some(target) if target != native_rate => {
                        Self::from_buffer(resample(&samples, native_rate, target), Some(target))
                    }
                    _ => Self::from_buffer(samples, Some(native_rate)),
                }
            }
            SourceInit::FromBuffer { samples, sample_rate } => Self::from_buffer(samples, sample_rate),
        }
    }

    pub fn load(path: impl Into<PathBuf>, sample_rate: Option<u32>) -> Result<Self, SourceError> {
        Self::new(SourceInit::FromFile { path: path.into(), sample_rate })
    }

    pub fn from_buffer(samples: Vec<f32>, sample_rate: Option<u32>) -> Result<Self, SourceError> {
        if samples.is_empty() {
            return Err(SourceError::Empty);
        }

        Ok(AudioSource {
            samples,
            sample_rate: sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
        })
    }

    pub fn len(&self) -> Time {
        self.samples.len()
    }

    /// Always false; kept for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Samples in `[start, end)`, clamped to the source. Empty if `start >= end`.
    pub fn slice(&self, start: Time, end: Time) -> &[f32] {
        let end = end.min(self.samples.len());
        let start = start.min(end);
        &self.samples[start..end]
    }
}
