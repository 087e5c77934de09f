//! Integration module for connecting object detection backends with the
//! trackers.
//!
//! Detector inference itself is out of scope; this module only defines the
//! seam: a `DetectionSource` produces per-frame detections, and a
//! `TrackerPipeline` drives a tracker with them.

mod builder;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use pipeline::TrackerPipeline;
