//! Pipeline-facing tracking node.
//!
//! The pipeline exchanges detections as (N, 4) arrays of normalized
//! (x1, y1, x2, y2) coordinates plus parallel label/score arrays. This node
//! bridges that convention to the trackers' pixel-coordinate world: it
//! denormalizes with the current frame's dimensions, runs the configured
//! tracking strategy, and renormalizes the surviving tracks on the way out.

use std::str::FromStr;

use ndarray::{Array2, ArrayView2};
use tracing::info;

use crate::error::{TrackError, check_unit_interval};
use crate::frame::Frame;
use crate::tracker::{
    BotSort, BotSortConfig, CorrelationTracker, Detection, IouTracker, TrackedObject, coords,
};

/// Algorithm choice for the simple (non-re-identifying) strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingType {
    Iou,
    Mosse,
}

impl FromStr for TrackingType {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iou" => Ok(Self::Iou),
            "mosse" => Ok(Self::Mosse),
            _ => Err(TrackError::InvalidChoice {
                param: "tracking_type",
                choices: r#"["iou", "mosse"]"#,
            }),
        }
    }
}

/// Configuration for the simple tracking strategies.
#[derive(Debug, Clone)]
pub struct SimpleTrackerConfig {
    pub tracking_type: TrackingType,
    /// Minimum IoU for frame-to-frame association
    pub iou_threshold: f32,
    /// Frames a track may go unmatched before removal
    pub max_lost: u32,
}

impl Default for SimpleTrackerConfig {
    fn default() -> Self {
        Self {
            tracking_type: TrackingType::Iou,
            iou_threshold: 0.1,
            max_lost: 10,
        }
    }
}

impl SimpleTrackerConfig {
    pub fn validate(&self) -> Result<(), TrackError> {
        check_unit_interval("iou_threshold", self.iou_threshold)
    }
}

/// Strategy selection, decided once at node construction and never switched
/// within a session.
#[derive(Debug, Clone)]
pub enum TrackerConfig {
    BotSort(BotSortConfig),
    Simple(SimpleTrackerConfig),
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::BotSort(BotSortConfig::default())
    }
}

/// Tracking results in the pipeline's coordinate convention: parallel
/// arrays, one row per live track.
#[derive(Debug, Clone)]
pub struct TrackedObjects {
    pub ids: Vec<u64>,
    /// Normalized (x1, y1, x2, y2), shape (M, 4)
    pub bboxes: Array2<f32>,
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
}

#[derive(Debug)]
enum Strategy {
    BotSort(BotSort),
    Iou(IouTracker),
    Correlation(CorrelationTracker),
}

impl Strategy {
    fn name(&self) -> &'static str {
        match self {
            Strategy::BotSort(_) => "bot_sort",
            Strategy::Iou(_) => "iou",
            Strategy::Correlation(_) => "mosse",
        }
    }
}

/// Tracking node: wires the detector's normalized output through the
/// selected tracker and back.
#[derive(Debug)]
pub struct TrackingNode {
    strategy: Strategy,
}

impl TrackingNode {
    /// Build a node from a validated configuration. Invalid values are
    /// rejected here, before any tracking state exists.
    pub fn new(config: TrackerConfig) -> Result<Self, TrackError> {
        let strategy = match config {
            TrackerConfig::BotSort(config) => Strategy::BotSort(BotSort::new(config)?),
            TrackerConfig::Simple(config) => {
                config.validate()?;
                match config.tracking_type {
                    TrackingType::Iou => {
                        Strategy::Iou(IouTracker::new(config.iou_threshold, config.max_lost))
                    }
                    TrackingType::Mosse => Strategy::Correlation(CorrelationTracker::new(
                        config.iou_threshold,
                        config.max_lost,
                    )),
                }
            }
        };
        info!(strategy = strategy.name(), "created tracking node");
        Ok(Self { strategy })
    }

    /// Track one frame of detections.
    ///
    /// `bboxes` is (N, 4) normalized; `labels` and `scores` must have N
    /// entries. Contract violations are rejected before any track state is
    /// touched, so a failed call leaves the tracker exactly as it was.
    pub fn track_detections(
        &mut self,
        frame: &Frame,
        bboxes: ArrayView2<f32>,
        labels: &[String],
        scores: &[f32],
    ) -> Result<TrackedObjects, TrackError> {
        if bboxes.nrows() != labels.len() || bboxes.nrows() != scores.len() {
            return Err(TrackError::LengthMismatch {
                bboxes: bboxes.nrows(),
                labels: labels.len(),
                scores: scores.len(),
            });
        }
        if bboxes.ncols() != 4 && bboxes.nrows() != 0 {
            return Err(TrackError::BadBboxShape {
                cols: bboxes.ncols(),
            });
        }

        let bboxes_px = coords::denormalize(&bboxes, frame.height(), frame.width());
        let detections: Vec<Detection> = bboxes_px
            .rows()
            .into_iter()
            .zip(labels.iter().zip(scores))
            .map(|(row, (label, &score))| {
                Detection::new(row[0], row[1], row[2], row[3], label.clone(), score)
            })
            .collect();

        let tracks: Vec<TrackedObject> = match &mut self.strategy {
            Strategy::BotSort(tracker) => tracker
                .update(&detections)
                .iter()
                .map(TrackedObject::from)
                .collect(),
            Strategy::Iou(tracker) => tracker.update(&detections),
            Strategy::Correlation(tracker) => tracker.update(frame, &detections),
        };

        let mut bboxes_out = Array2::zeros((tracks.len(), 4));
        let mut ids = Vec::with_capacity(tracks.len());
        let mut out_labels = Vec::with_capacity(tracks.len());
        let mut out_scores = Vec::with_capacity(tracks.len());
        for (i, track) in tracks.iter().enumerate() {
            let tlbr = track.bbox.to_tlbr();
            for (j, v) in tlbr.into_iter().enumerate() {
                bboxes_out[[i, j]] = v;
            }
            ids.push(track.id);
            out_labels.push(track.label.clone());
            out_scores.push(track.score);
        }

        Ok(TrackedObjects {
            ids,
            bboxes: coords::normalize(&bboxes_out.view(), frame.height(), frame.width()),
            labels: out_labels,
            scores: out_scores,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn blank_frame_data() -> Vec<u8> {
        vec![0u8; 600 * 400 * 3]
    }

    #[test]
    fn test_invalid_tracking_type_string() {
        let err = "median_flow".parse::<TrackingType>().unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"tracking_type must be one of ["iou", "mosse"]"#
        );
    }

    #[test]
    fn test_invalid_iou_threshold_rejected_at_construction() {
        let config = TrackerConfig::Simple(SimpleTrackerConfig {
            iou_threshold: 1.5,
            ..Default::default()
        });
        let err = TrackingNode::new(config).unwrap_err();
        assert!(matches!(
            err,
            TrackError::ConfigOutOfBounds {
                param: "iou_threshold",
                ..
            }
        ));
    }

    #[test]
    fn test_length_mismatch_is_rejected_before_tracking() {
        let data = blank_frame_data();
        let frame = Frame::new(&data, 600, 400).unwrap();
        let mut node = TrackingNode::new(TrackerConfig::default()).unwrap();

        let bboxes = array![[0.1f32, 0.2, 0.3, 0.4]];
        let err = node
            .track_detections(&frame, bboxes.view(), &[], &[0.9])
            .unwrap_err();
        assert!(matches!(
            err,
            TrackError::LengthMismatch {
                bboxes: 1,
                labels: 0,
                scores: 1
            }
        ));

        // the failed call must not have created any track
        let empty = Array2::<f32>::zeros((0, 4));
        let out = node
            .track_detections(&frame, empty.view(), &[], &[])
            .unwrap();
        assert!(out.ids.is_empty());
    }

    #[test]
    fn test_bad_bbox_shape_is_rejected() {
        let data = blank_frame_data();
        let frame = Frame::new(&data, 600, 400).unwrap();
        let mut node = TrackingNode::new(TrackerConfig::default()).unwrap();

        let bboxes = array![[0.1f32, 0.2, 0.3]];
        let err = node
            .track_detections(&frame, bboxes.view(), &["person".into()], &[0.9])
            .unwrap_err();
        assert!(matches!(err, TrackError::BadBboxShape { cols: 3 }));
    }

    #[test]
    fn test_round_trips_normalized_coordinates() {
        let data = blank_frame_data();
        let frame = Frame::new(&data, 600, 400).unwrap();
        let mut node = TrackingNode::new(TrackerConfig::default()).unwrap();

        let bboxes = array![[0.1f32, 0.2, 0.3, 0.4]];
        let out = node
            .track_detections(&frame, bboxes.view(), &["person".into()], &[0.9])
            .unwrap();

        assert_eq!(out.ids, vec![1]);
        assert_eq!(out.labels, vec!["person".to_string()]);
        assert_eq!(out.bboxes.dim(), (1, 4));
        for (a, b) in bboxes.iter().zip(out.bboxes.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_cardinality_invariant() {
        let data = blank_frame_data();
        let frame = Frame::new(&data, 600, 400).unwrap();
        let mut node = TrackingNode::new(TrackerConfig::Simple(SimpleTrackerConfig::default()))
            .unwrap();

        let bboxes = array![[0.1f32, 0.2, 0.3, 0.4], [0.5, 0.5, 0.7, 0.9]];
        let labels = vec!["person".to_string(), "car".to_string()];
        let out = node
            .track_detections(&frame, bboxes.view(), &labels, &[0.9, 0.8])
            .unwrap();

        assert_eq!(out.ids.len(), out.bboxes.nrows());
        assert_eq!(out.ids.len(), out.labels.len());
        assert_eq!(out.ids.len(), out.scores.len());
    }
}
