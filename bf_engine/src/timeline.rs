use std::cmp::{max, min};
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::archive::{SegmentArchive, SegmentId};
use crate::segment::{Segment, SegmentError};
use crate::source::AudioSource;
use crate::Time;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    #[error("segment {0:?} is not in the archive")]
    UnknownSegment(SegmentId),

    #[error("segment {0:?} is empty")]
    EmptySegment(SegmentId),

    #[error(transparent)]
    Segment(#[from] SegmentError),
}

/// What an insert did to a segment that was already on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Displacement {
    /// The inserted segment itself was placed at `from` and has been taken off first.
    Lifted { id: SegmentId, from: Time },

    /// Sat exactly at the insert position. Its start was trimmed by the new segment's length and it
    /// now follows the new segment.
    Shifted { id: SegmentId, from: Time, to: Time },

    /// Sat exactly at the insert position but wasn't longer than the new segment. It's off the
    /// timeline now.
    Dropped { id: SegmentId, at: Time },

    /// Started inside the new span. Its start was trimmed and it now begins where the new segment
    /// ends.
    TrimmedStart { id: SegmentId, from: Time, to: Time },

    /// Started before the new span and reached into it. It was cut at the insert position, and
    /// `discarded_tail` samples that lay past the end of the new span are lost as well.
    TrimmedEnd { id: SegmentId, at: Time, discarded_tail: Time },

    /// Lay entirely inside the new span. It's off the timeline now.
    Removed { id: SegmentId, at: Time },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InsertReport {
    pub displacements: Vec<Displacement>,
}

impl InsertReport {
    /// True if nothing else on the timeline was touched.
    pub fn is_clean(&self) -> bool {
        self.displacements.iter().all(|d| matches!(d, Displacement::Lifted { .. }))
    }

    /// The segment that sat at the insert position and was dropped instead of shifted, if any.
    pub fn displaced_and_dropped(&self) -> Option<SegmentId> {
        self.displacements.iter().find_map(|d| match *d {
            Displacement::Dropped { id, .. } => Some(id),
            _ => None,
        })
    }

    /// Segments this insert took off the timeline. They remain in the archive.
    pub fn off_timeline(&self) -> Vec<SegmentId> {
        self.displacements.iter()
            .filter_map(|d| match *d {
                Displacement::Dropped { id, .. } | Displacement::Removed { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }
}

enum Change {
    TrimStart { id: SegmentId, at: Time, amount: Time },
    TrimEnd { id: SegmentId, at: Time, keep: Time, discarded_tail: Time },
}

/// A single track of segments placed at sample positions.
///
/// Placements never overlap: inserting a segment trims, moves or removes whatever it covers. The
/// archive keeps every segment ever created, including the ones that were pushed off the timeline,
/// so they can be inserted again.
#[derive(Debug, Default, Clone)]
pub struct Timeline {
    placements: BTreeMap<Time, SegmentId>,
    archive: SegmentArchive,
}

impl Timeline {
    pub fn new() -> Self {
        Timeline::default()
    }

    /// Archives a segment exposing all of `source`. The segment isn't placed.
    pub fn create_segment(&mut self, source: Arc<AudioSource>) -> SegmentId {
        self.archive.add(Segment::new(source))
    }

    /// Archives an already trimmed segment. The segment isn't placed.
    pub fn add_segment(&mut self, segment: Segment) -> SegmentId {
        self.archive.add(segment)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.archive.get(id)
    }

    pub fn archive(&self) -> &SegmentArchive {
        &self.archive
    }

    /// Returns an iterator over the placements in order of position.
    pub fn placements(&self) -> impl Iterator<Item = (Time, SegmentId)> + '_ {
        self.placements.iter().map(|(&position, &id)| (position, id))
    }

    pub fn position_of(&self, id: SegmentId) -> Option<Time> {
        self.placements.iter()
            .find(|(_, &placed)| placed == id)
            .map(|(&position, _)| position)
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Length of the rendered output: the last placement's position plus its length.
    pub fn len(&self) -> Time {
        self.placements.iter()
            .next_back()
            .map(|(&position, &id)| position + self.archive[id].len())
            .unwrap_or(0)
    }

    /// Checks that no two placements overlap.
    pub fn is_disjoint(&self) -> bool {
        self.placements.iter()
            .zip(self.placements.keys().skip(1))
            .all(|((&position, &id), &next)| position + self.archive[id].len() <= next)
    }

    /// Places segment `id` at `position`. Anything the new segment covers gives way to it.
    ///
    /// A segment sitting exactly at `position` is shifted behind the new one, or dropped if it
    /// would be left empty. Segments starting inside the new span lose their start and are moved
    /// to its end, or are removed if nothing would remain. A segment starting before the new span
    /// is cut at `position`. If it reached past the end of the new span, that part is lost since
    /// a segment can't be split in two.
    ///
    /// All of this is recorded in the returned report. Only an unknown or empty segment is an
    /// error.
    pub fn insert(&mut self, position: Time, id: SegmentId) -> Result<InsertReport, TimelineError> {
        let len = self.archive.get(id).ok_or(TimelineError::UnknownSegment(id))?.len();
        if len == 0 {
            return Err(TimelineError::EmptySegment(id));
        }

        let end = position + len;
        let mut report = InsertReport::default();

        if let Some(from) = self.position_of(id) {
            self.placements.remove(&from);
            report.displacements.push(Displacement::Lifted { id, from });
        }

        if let Some(moved) = self.placements.remove(&position) {
            match self.archive[moved].trim_start(len) {
                Ok(()) => {
                    self.placements.insert(end, moved);
                    report.displacements.push(Displacement::Shifted { id: moved, from: position, to: end });
                }
                Err(e) => {
                    debug!("dropping {:?} displaced from {}: {}", moved, position, e);
                    report.displacements.push(Displacement::Dropped { id: moved, at: position });
                }
            }
        }

        for change in self.overlaps(position, end) {
            let displacement = self.apply(change, end);
            debug!("insert of {:?} at {}: {:?}", id, position, displacement);
            report.displacements.push(displacement);
        }

        self.placements.insert(position, id);

        debug_assert!(self.is_disjoint(), "placements overlap after insert at {}", position);
        Ok(report)
    }

    /// Collects the changes needed to clear `[position, end)`. Nothing is modified here.
    fn overlaps(&self, position: Time, end: Time) -> Vec<Change> {
        self.placements.range(..end)
            .filter_map(|(&check_position, &check_id)| {
                let check_end = check_position + self.archive[check_id].len();

                if position < check_position {
                    Some(Change::TrimStart {
                        id: check_id,
                        at: check_position,
                        amount: end - check_position,
                    })
                } else if check_position < position && check_end > position {
                    Some(Change::TrimEnd {
                        id: check_id,
                        at: check_position,
                        keep: position - check_position,
                        discarded_tail: check_end.saturating_sub(end),
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    fn apply(&mut self, change: Change, end: Time) -> Displacement {
        match change {
            Change::TrimStart { id, at, amount } => {
                self.placements.remove(&at);
                match self.archive[id].trim_start(amount) {
                    Ok(()) => {
                        self.placements.insert(end, id);
                        Displacement::TrimmedStart { id, from: at, to: end }
                    }
                    Err(_) => Displacement::Removed { id, at },
                }
            }
            Change::TrimEnd { id, at, keep, discarded_tail } => {
                match self.archive[id].truncate(keep) {
                    Ok(()) => Displacement::TrimmedEnd { id, at, discarded_tail },
                    Err(_) => {
                        self.placements.remove(&at);
                        Displacement::Removed { id, at }
                    }
                }
            }
        }
    }

    /// Renders `[start_time, start_time + buf.len())` of the timeline into `buf`. Anything past
    /// [`Timeline::len`] is silence.
    pub fn render_into(&self, start_time: Time, buf: &mut [f32]) {
        buf.fill(0.0);

        let render_end = min(start_time + buf.len(), self.len());
        if start_time >= render_end {
            return;
        }

        for (&position, &id) in self.placements.range(..render_end) {
            let window = self.archive[id].window();
            let from = max(position, start_time);
            let to = min(position + window.len(), render_end);
            if from >= to {
                continue;
            }

            buf[from - start_time..to - start_time]
                .copy_from_slice(&window[from - position..to - position]);
        }
    }

    /// Renders the whole timeline. Gaps between placements are silence, volume and pan are not
    /// applied. An empty timeline renders to an empty buffer.
    pub fn render(&self) -> Vec<f32> {
        let mut buf = vec![0.0f32; self.len()];
        self.render_into(0, &mut buf);
        buf
    }
}
