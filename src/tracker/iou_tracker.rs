//! Simple single-pass IoU tracker for deployments without re-identification.

use tracing::debug;

use crate::tracker::rect::Rect;
use crate::tracker::track::{Detection, TrackedObject};

#[derive(Debug, Clone)]
struct SimpleTrack {
    id: u64,
    bbox: Rect,
    label: String,
    score: f32,
    /// Consecutive frames without a matching detection
    lost: u32,
}

/// Greedy IoU matcher between tracks and detections.
///
/// Candidate pairs at or above `iou_threshold` are accepted in descending
/// IoU order, each track and detection at most once. Ties fall back to
/// index order, which keeps the result deterministic.
pub(super) fn greedy_iou_match(
    track_boxes: &[Rect],
    det_boxes: &[Rect],
    iou_threshold: f32,
) -> Vec<(usize, usize)> {
    let mut candidates = Vec::new();
    for (ti, t) in track_boxes.iter().enumerate() {
        for (di, d) in det_boxes.iter().enumerate() {
            let iou = t.iou(d);
            if iou >= iou_threshold {
                candidates.push((iou, ti, di));
            }
        }
    }
    candidates.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
            .then(a.2.cmp(&b.2))
    });

    let mut track_taken = vec![false; track_boxes.len()];
    let mut det_taken = vec![false; det_boxes.len()];
    let mut matches = Vec::new();
    for (_, ti, di) in candidates {
        if !track_taken[ti] && !det_taken[di] {
            track_taken[ti] = true;
            det_taken[di] = true;
            matches.push((ti, di));
        }
    }
    matches
}

/// Tracker that associates detections frame-to-frame purely by bounding box
/// overlap. No motion model: a track's box is wherever its last detection
/// was. Tracks missing for more than `max_lost` frames are dropped.
#[derive(Debug)]
pub struct IouTracker {
    iou_threshold: f32,
    max_lost: u32,
    last_id: u64,
    tracks: Vec<SimpleTrack>,
}

impl IouTracker {
    /// Thresholds are validated by the owning node before construction.
    pub fn new(iou_threshold: f32, max_lost: u32) -> Self {
        Self {
            iou_threshold,
            max_lost,
            last_id: 0,
            tracks: Vec::new(),
        }
    }

    pub fn update(&mut self, detections: &[Detection]) -> Vec<TrackedObject> {
        let track_boxes: Vec<Rect> = self.tracks.iter().map(|t| t.bbox).collect();
        let det_boxes: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();
        let matches = greedy_iou_match(&track_boxes, &det_boxes, self.iou_threshold);

        let mut track_matched = vec![false; self.tracks.len()];
        let mut det_matched = vec![false; detections.len()];
        for (ti, di) in matches {
            let track = &mut self.tracks[ti];
            let det = &detections[di];
            track.bbox = det.bbox;
            track.label = det.label.clone();
            track.score = det.score;
            track.lost = 0;
            track_matched[ti] = true;
            det_matched[di] = true;
        }

        for (ti, track) in self.tracks.iter_mut().enumerate() {
            if !track_matched[ti] {
                track.lost += 1;
            }
        }
        let max_lost = self.max_lost;
        self.tracks.retain(|t| {
            if t.lost > max_lost {
                debug!(id = t.id, "dropped lost track");
                false
            } else {
                true
            }
        });

        for (di, det) in detections.iter().enumerate() {
            if !det_matched[di] {
                self.last_id += 1;
                debug!(id = self.last_id, "spawned new track");
                self.tracks.push(SimpleTrack {
                    id: self.last_id,
                    bbox: det.bbox,
                    label: det.label.clone(),
                    score: det.score,
                    lost: 0,
                });
            }
        }

        self.tracks
            .iter()
            .map(|t| TrackedObject {
                id: t.id,
                bbox: t.bbox,
                label: t.label.clone(),
                score: t.score,
            })
            .collect()
    }
}
