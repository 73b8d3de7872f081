use std::ops::Range;
use std::sync::Arc;

use crate::source::AudioSource;
use crate::Time;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("index {index} is out of bounds (valid: {valid:?})")]
    OutOfBounds {
        index: Time,
        valid: Range<Time>,
    },
}

/// A window `[window_start, window_end)` into an [`AudioSource`].
///
/// The window is never empty and never reaches past the end of the source. Volume and pan are
/// carried along but not applied when rendering.
#[derive(Debug, Clone)]
pub struct Segment {
    source: Arc<AudioSource>,
    window_start: Time,
    window_end: Time,
    volume: f32,
    pan: f32,
}

impl Segment {
    /// Creates a segment exposing the whole source.
    pub fn new(source: Arc<AudioSource>) -> Self {
        let window_end = source.len();
        Segment {
            source,
            window_start: 0,
            window_end,
            volume: 1.0,
            pan: 0.0,
        }
    }

    pub fn with_window(source: Arc<AudioSource>, start: Time, end: Time) -> Result<Self, SegmentError> {
        if end == 0 || end > source.len() {
            return Err(SegmentError::OutOfBounds { index: end, valid: 1..source.len() + 1 });
        }

        if start >= end {
            return Err(SegmentError::OutOfBounds { index: start, valid: 0..end });
        }

        let mut segment = Segment::new(source);
        segment.window_start = start;
        segment.window_end = end;
        Ok(segment)
    }

    pub fn source(&self) -> &Arc<AudioSource> {
        &self.source
    }

    pub fn window_start(&self) -> Time {
        self.window_start
    }

    pub fn window_end(&self) -> Time {
        self.window_end
    }

    pub fn len(&self) -> Time {
        self.window_end - self.window_start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The samples this segment exposes.
    pub fn window(&self) -> &[f32] {
        self.source.slice(self.window_start, self.window_end)
    }

    pub fn set_window_start(&mut self, index: Time) -> Result<(), SegmentError> {
        let upper = self.window_end.min(self.source.len());
        if index >= upper {
            return Err(SegmentError::OutOfBounds { index, valid: 0..upper });
        }

        self.window_start = index;
        Ok(())
    }

    /// The end can't be set to the source length. Only the constructors produce windows that reach
    /// the end of the source.
    pub fn set_window_end(&mut self, index: Time) -> Result<(), SegmentError> {
        let valid = self.window_start + 1..self.source.len();
        if !valid.contains(&index) {
            return Err(SegmentError::OutOfBounds { index, valid });
        }

        self.window_end = index;
        Ok(())
    }

    /// Moves the window start forward by `amount` samples.
    pub(crate) fn trim_start(&mut self, amount: Time) -> Result<(), SegmentError> {
        self.set_window_start(self.window_start + amount)
    }

    /// Shortens the window to `len` samples, keeping its start.
    pub(crate) fn truncate(&mut self, len: Time) -> Result<(), SegmentError> {
        self.set_window_end(self.window_start + len)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
    }
}
