use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use bf_engine::analysis::{trim_silence, BeatDetector, EnergyBeatDetector};
use bf_engine::settings::MetronomeSettings;
use bf_engine::{arrange, wav, AudioSource, Settings};

const BEATFLIP_CONFIG: &str = "BEATFLIP_CONFIG";
const DEFAULT_BEATFLIP_CONFIG: &str = "beatflip.json";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let settings = init_settings()?;
    let song = load_song(&settings)?;
    let sample_rate = song.sample_rate();

    let mut detector = EnergyBeatDetector::from(&settings.detector);
    let track = detector.track(song.samples(), sample_rate);
    let samples_per_beat = track.samples_per_beat(sample_rate).unwrap_or(0.0);
    info!(
        "estimated tempo: {:.2} bpm, @ a sample rate of {} Hz we have {:.0} samples/beat",
        track.tempo_bpm, sample_rate, samples_per_beat
    );

    if track.beats.len() < 3 {
        warn!("only {} beats detected, nothing to flip", track.beats.len());
    }

    let offset = (samples_per_beat * settings.offset_percent) as i64;
    let flipped = arrange::flip_beats(&song, &track.beats, offset)?;
    wav::write(&settings.output, &flipped.render(), sample_rate)
        .with_context(|| format!("failed to write {}", settings.output.display()))?;
    info!("wrote {} ({} samples)", settings.output.display(), flipped.len());

    if let Some(metronome) = &settings.metronome {
        write_metronome(metronome, &track.beats, sample_rate)?;
    }

    Ok(())
}

fn init_settings() -> anyhow::Result<Settings> {
    let path = env::var(BEATFLIP_CONFIG)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_BEATFLIP_CONFIG));

    if !path.exists() {
        info!("{} not found, using default settings", path.display());
        return Ok(Settings::default());
    }

    Settings::load(&path).with_context(|| format!("failed to load settings from {}", path.display()))
}

fn load_song(settings: &Settings) -> anyhow::Result<Arc<AudioSource>> {
    let song = AudioSource::load(&settings.input, settings.sample_rate)
        .with_context(|| format!("failed to load {}", settings.input.display()))?;

    let Some(top_db) = settings.trim_top_db else {
        return Ok(Arc::new(song));
    };

    let range = trim_silence(song.samples(), top_db);
    info!("trimmed silence, keeping samples {:?} of {}", range, song.len());
    let trimmed = AudioSource::from_buffer(song.slice(range.start, range.end).to_vec(), Some(song.sample_rate()))
        .context("song is silent")?;
    Ok(Arc::new(trimmed))
}

fn write_metronome(metronome: &MetronomeSettings, beats: &[usize], sample_rate: u32) -> anyhow::Result<()> {
    let click = Arc::new(load_click(&metronome.click, sample_rate)?);
    let timeline = arrange::metronome(&click, beats)?;

    wav::write(&metronome.output, &timeline.render(), sample_rate)
        .with_context(|| format!("failed to write {}", metronome.output.display()))?;
    info!("wrote metronome {} ({} clicks)", metronome.output.display(), timeline.placements().count());
    Ok(())
}

fn load_click(path: &Path, sample_rate: u32) -> anyhow::Result<AudioSource> {
    AudioSource::load(path, Some(sample_rate)).with_context(|| format!("failed to load click {}", path.display()))
}
