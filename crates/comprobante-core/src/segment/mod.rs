//! Receipt region segmentation.

mod detector;

pub use detector::{CandidateRegion, RegionDetector, SegmentDebug, Segmentation};
