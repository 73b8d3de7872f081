//! Arrangements built by inserting segments onto a [`Timeline`].

use std::sync::Arc;

use tracing::debug;

use crate::{AudioSource, Segment, SegmentId, Time, Timeline, TimelineError};

/// Cuts `source` at every beat and archives the pieces on `timeline` without placing them.
///
/// The pieces are the audio before the first beat, each beat up to the next and the last beat up
/// to the end. Empty pieces are skipped and beats past the end of the source are ignored.
pub fn split_beats(timeline: &mut Timeline, source: &Arc<AudioSource>, beats: &[Time]) -> Result<Vec<SegmentId>, TimelineError> {
    let len = source.len();
    let bounds: Vec<Time> = std::iter::once(0)
        .chain(beats.iter().map(|&b| b.min(len)))
        .chain(std::iter::once(len))
        .collect();

    let mut ids = Vec::with_capacity(bounds.len() - 1);
    for pair in bounds.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if start >= end {
            continue;
        }

        ids.push(timeline.add_segment(Segment::with_window(source.clone(), start, end)?));
    }

    Ok(ids)
}

/// Places the segments one after another, starting at the current end of the timeline.
pub fn concatenate(timeline: &mut Timeline, ids: &[SegmentId]) -> Result<(), TimelineError> {
    for &id in ids {
        let position = timeline.len();
        timeline.insert(position, id)?;
    }

    Ok(())
}

/// Swaps every pair of consecutive beats.
///
/// For beats `b0, b1, b2, ...` the result plays `b1..b2`, `b0..b1`, `b3..b4`, `b2..b3` and so on.
/// Every range is moved by `offset` samples first, and ranges falling outside the source are left
/// out.
pub fn flip_beats(source: &Arc<AudioSource>, beats: &[Time], offset: i64) -> Result<Timeline, TimelineError> {
    let len = source.len() as i64;
    let mut timeline = Timeline::new();
    let mut ids = Vec::new();

    for i in (0..beats.len().saturating_sub(2)).step_by(2) {
        for (start, end) in [(beats[i + 1], beats[i + 2]), (beats[i], beats[i + 1])] {
            let start = start as i64 + offset;
            let end = end as i64 + offset;
            if start < 0 || end > len || start >= end {
                debug!("skipping beat {}..{} outside the source", start, end);
                continue;
            }

            let segment = Segment::with_window(source.clone(), start as Time, end as Time)?;
            ids.push(timeline.add_segment(segment));
        }
    }

    concatenate(&mut timeline, &ids)?;
    Ok(timeline)
}

/// Places `click` on every beat, aligned so the loudest sample of the click lands on the beat.
/// Beats too early to fit the part of the click before its peak are skipped.
pub fn metronome(click: &Arc<AudioSource>, beats: &[Time]) -> Result<Timeline, TimelineError> {
    let peak = argmax(click.samples());
    let mut timeline = Timeline::new();

    for &beat in beats {
        match beat.checked_sub(peak) {
            Some(position) if position > 0 => {
                let id = timeline.create_segment(click.clone());
                timeline.insert(position, id)?;
            }
            _ => debug!("skipping click at {}", beat),
        }
    }

    Ok(timeline)
}

fn argmax(samples: &[f32]) -> usize {
    samples.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &s)| if s > best.1 { (i, s) } else { best })
        .0
}
