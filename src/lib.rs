//! Multi-object tracking node for computer-vision pipelines.
//!
//! A detector produces per-frame bounding boxes, labels and confidence
//! scores; this crate assigns them stable identities across frames. Three
//! strategies sit behind one node contract, selected once at construction:
//!
//! - [`tracker::BotSort`] — two-stage association over confidence tiers
//!   with a Kalman motion model, in the BoT-SORT lineage. Recovers tracks
//!   through brief low-confidence detections and re-identifies lost tracks
//!   within a configurable buffer.
//! - [`tracker::IouTracker`] — greedy frame-to-frame overlap matching for
//!   simple deployments.
//! - [`tracker::CorrelationTracker`] — MOSSE-style template correlation
//!   that keeps following objects through frames without detections.
//!
//! [`TrackingNode`] bridges the pipeline's normalized-coordinate convention
//! to the trackers' pixel coordinates; the [`integration`] module provides
//! the seam toward detection backends.

pub mod error;
pub mod frame;
pub mod integration;
pub mod node;
pub mod tracker;

pub use error::TrackError;
pub use frame::Frame;
pub use node::{
    SimpleTrackerConfig, TrackedObjects, TrackerConfig, TrackingNode, TrackingType,
};
pub use tracker::{
    BotSort, BotSortConfig, Detection, Rect, Track, TrackState, TrackedObject,
};
