mod archive;
mod segment;
mod source;
mod timeline;

pub mod analysis;
pub mod arrange;
pub mod resample;
pub mod settings;
pub mod wav;

pub use archive::{SegmentArchive, SegmentId};
pub use segment::{Segment, SegmentError};
pub use settings::Settings;
pub use source::{AudioSource, SourceError, SourceInit, DEFAULT_SAMPLE_RATE};
pub use timeline::{Displacement, InsertReport, Timeline, TimelineError};

pub type Time = usize;  // in samples
