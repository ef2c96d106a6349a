//! Candidate extraction and deduplication.

pub mod nms;
pub mod overlap;
pub mod select;

pub use overlap::{filter_overlapping, ScoredRect};
pub use select::{select_peaks, SelectParams};
