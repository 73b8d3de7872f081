//! Beat tracking and silence trimming.
//!
//! The timeline doesn't care where insert positions come from. Anything implementing
//! [`BeatDetector`] can provide them; [`EnergyBeatDetector`] is a simple default that picks
//! sudden rises in frame energy.

use std::ops::Range;

use tracing::debug;

use crate::settings::DetectorSettings;
use crate::Time;

const DEFAULT_WINDOW_SIZE: usize = 1024;
const DEFAULT_HOP_SIZE: usize = 512;
const DEFAULT_THRESHOLD: f32 = 0.3;
const DEFAULT_MIN_GAP_MS: f32 = 50.0;

/// Estimated tempo and beat positions of a piece of audio.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatTrack {
    /// Beats per minute, 0 if fewer than two beats were found
    pub tempo_bpm: f64,
    /// Sample positions of the beats, ascending
    pub beats: Vec<Time>,
}

impl BeatTrack {
    /// Builds a track from beat positions, estimating the tempo from the median beat interval.
    pub fn from_beats(beats: Vec<Time>, sample_rate: u32) -> Self {
        let mut intervals: Vec<Time> = beats.windows(2)
            .map(|pair| pair[1].saturating_sub(pair[0]))
            .filter(|&interval| interval > 0)
            .collect();
        intervals.sort_unstable();

        let tempo_bpm = match intervals.get(intervals.len() / 2) {
            Some(&median) => 60.0 * sample_rate as f64 / median as f64,
            None => 0.0,
        };

        BeatTrack { tempo_bpm, beats }
    }

    pub fn samples_per_beat(&self, sample_rate: u32) -> Option<f64> {
        if self.tempo_bpm > 0.0 {
            Some(60.0 * sample_rate as f64 / self.tempo_bpm)
        } else {
            None
        }
    }
}

pub trait BeatDetector {
    /// Finds the beats in mono `samples`.
    fn track(&mut self, samples: &[f32], sample_rate: u32) -> BeatTrack;
}

/// Onset based beat detector.
///
/// Samples are cut into frames of `window_size` every `hop_size` samples. The onset strength of a
/// frame is how much its energy rose over the previous frame. Local maxima of the onset strength
/// above an adaptive threshold become beats.
#[derive(Debug, Clone)]
pub struct EnergyBeatDetector {
    window_size: usize,
    hop_size: usize,
    threshold: f32,
    min_gap_ms: f32,
}

impl Default for EnergyBeatDetector {
    fn default() -> Self {
        Self::with_params(DEFAULT_WINDOW_SIZE, DEFAULT_HOP_SIZE)
    }
}

impl From<&DetectorSettings> for EnergyBeatDetector {
    fn from(settings: &DetectorSettings) -> Self {
        let mut detector = Self::with_params(settings.window_size, settings.hop_size);
        detector.set_threshold(settings.threshold);
        detector.set_min_gap_ms(settings.min_gap_ms);
        detector
    }
}

impl EnergyBeatDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(window_size: usize, hop_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            hop_size: hop_size.max(1),
            threshold: DEFAULT_THRESHOLD,
            min_gap_ms: DEFAULT_MIN_GAP_MS,
        }
    }

    /// Set detection threshold (0.0 - 1.0)
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.clamp(0.0, 1.0);
    }

    pub fn set_min_gap_ms(&mut self, gap_ms: f32) {
        self.min_gap_ms = gap_ms.max(0.0);
    }

    /// Onset strength per frame as `(frame start, strength)`.
    pub fn onset_strength(&self, samples: &[f32]) -> Vec<(Time, f32)> {
        if samples.len() < self.window_size {
            return Vec::new();
        }

        let frame_count = (samples.len() - self.window_size) / self.hop_size + 1;
        let mut previous = 0.0f32;

        (0..frame_count)
            .map(|frame| {
                let start = frame * self.hop_size;
                let energy = samples[start..start + self.window_size]
                    .iter()
                    .map(|s| s * s)
                    .sum::<f32>()
                    .sqrt();

                let rise = (energy - previous).max(0.0);
                previous = energy;
                (start, rise)
            })
            .collect()
    }

    fn find_peaks(&self, onsets: &[(Time, f32)]) -> Vec<Time> {
        if onsets.len() < 3 {
            return Vec::new();
        }

        let len = onsets.len() as f32;
        let (sum, sum_sq) = onsets.iter()
            .fold((0.0f32, 0.0f32), |(s, sq), &(_, v)| (s + v, sq + v * v));
        let mean = sum / len;
        let std_dev = (sum_sq / len - mean * mean).max(0.0).sqrt();
        let adaptive_threshold = mean + std_dev * self.threshold * 3.0;

        onsets.windows(3)
            .filter(|w| w[1].1 > w[0].1 && w[1].1 > w[2].1 && w[1].1 > adaptive_threshold)
            .map(|w| w[1].0)
            .collect()
    }
}

impl BeatDetector for EnergyBeatDetector {
    fn track(&mut self, samples: &[f32], sample_rate: u32) -> BeatTrack {
        let min_gap = (self.min_gap_ms / 1000.0 * sample_rate as f32) as Time;
        let peaks = self.find_peaks(&self.onset_strength(samples));

        let mut beats: Vec<Time> = Vec::with_capacity(peaks.len());
        for position in peaks {
            match beats.last() {
                Some(&last) if position < last + min_gap => continue,
                _ => beats.push(position),
            }
        }

        let track = BeatTrack::from_beats(beats, sample_rate);
        debug!("tracked {} beats, {:.2} bpm", track.beats.len(), track.tempo_bpm);
        track
    }
}

/// Range of `samples` left after cutting leading and trailing audio quieter than `top_db` below
/// the peak. Empty for silence.
pub fn trim_silence(samples: &[f32], top_db: f32) -> Range<usize> {
    let peak = samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
    if peak == 0.0 {
        return 0..0;
    }

    let floor = peak * 10f32.powf(-top_db / 20.0);
    let loud = |s: &f32| s.abs() >= floor;

    match (samples.iter().position(loud), samples.iter().rposition(loud)) {
        (Some(first), Some(last)) => first..last + 1,
        _ => 0..0,
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    const PERIOD: usize = 22 * DEFAULT_HOP_SIZE;

    fn clicks(positions: &[usize], len: usize) -> Vec<f32> {
        let mut samples = vec![0.0f32; len];
        for &pos in positions {
            for i in 0..50usize.min(len - pos) {
                samples[pos + i] += 0.8 * (-0.1 * i as f32).exp();
            }
        }
        samples
    }

    #[test]
    fn test_detects_clicks() {
        let positions: Vec<usize> = (1..5).map(|k| k * PERIOD + 100).collect();
        let samples = clicks(&positions, 6 * PERIOD);

        let mut detector = EnergyBeatDetector::new();
        let track = detector.track(&samples, 22050);

        assert_eq!(track.beats.len(), positions.len());
        for (beat, click) in track.beats.iter().zip(&positions) {
            assert!(beat <= click && click - beat < DEFAULT_WINDOW_SIZE);
        }
        assert_relative_eq!(track.tempo_bpm, 60.0 * 22050.0 / PERIOD as f64);
    }

    #[test]
    fn test_silence_has_no_beats() {
        let mut detector = EnergyBeatDetector::new();
        let track = detector.track(&vec![0.0; 22050], 22050);
        assert!(track.beats.is_empty());
        assert_eq!(track.tempo_bpm, 0.0);
        assert_eq!(track.samples_per_beat(22050), None);
    }

    #[test]
    fn test_short_input() {
        let detector = EnergyBeatDetector::new();
        assert!(detector.onset_strength(&[0.5; 100]).is_empty());
    }

    #[test]
    fn test_min_gap() {
        let positions = [PERIOD + 100, PERIOD + 100 + 4 * DEFAULT_HOP_SIZE, 3 * PERIOD + 100];
        let samples = clicks(&positions, 5 * PERIOD);

        let mut detector = EnergyBeatDetector::new();
        detector.set_min_gap_ms(500.0);
        let track = detector.track(&samples, 22050);

        assert_eq!(track.beats.len(), 2);
    }

    #[test]
    fn test_tempo_from_median_interval() {
        let track = BeatTrack::from_beats(vec![0, 100, 200, 290, 400, 1000], 1000);
        assert_relative_eq!(track.tempo_bpm, 600.0);
        assert_relative_eq!(track.samples_per_beat(1000).unwrap(), 100.0);
    }

    #[test]
    fn test_trim_silence() {
        let samples = [0.0, 0.001, 0.5, -1.0, 0.2, 0.0002, 0.0];
        assert_eq!(trim_silence(&samples, 20.0), 2..5);
        assert_eq!(trim_silence(&samples, 80.0), 1..6);
        assert_eq!(trim_silence(&[0.0; 4], 60.0), 0..0);
    }
}
