use std::ops::{Index, IndexMut};

use crate::Segment;

#[derive(Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Copy, Clone)]
pub struct SegmentId(usize);

/// Owns every segment created for a timeline. Segments are never removed, so an id stays valid
/// for the lifetime of the archive.
#[derive(Debug, Default, Clone)]
pub struct SegmentArchive {
    segments: Vec<Segment>,
}

impl SegmentArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, segment: Segment) -> SegmentId {
        let id = SegmentId(self.segments.len());
        self.segments.push(segment);
        id
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, &Segment)> + '_ {
        self.segments.iter()
            .enumerate()
            .map(|(i, s)| (SegmentId(i), s))
    }
}

impl Index<SegmentId> for SegmentArchive {
    type Output = Segment;

    fn index(&self, id: SegmentId) -> &Segment {
        &self.segments[id.0]
    }
}

impl IndexMut<SegmentId> for SegmentArchive {
    fn index_mut(&mut self, id: SegmentId) -> &mut Segment {
        &mut self.segments[id.0]
    }
}
