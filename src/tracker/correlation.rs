//! Correlation-filter tracker in the MOSSE tradition.
//!
//! Each track keeps a zero-mean, unit-norm grayscale template of its object.
//! Every frame the template is matched against candidate patches in a local
//! search window by normalized cross-correlation, so the box keeps following
//! the object even across frames with no detection at all. Detections, when
//! present, re-seed matched templates and spawn trackers for new objects.

use tracing::debug;

use crate::frame::Frame;
use crate::tracker::iou_tracker::greedy_iou_match;
use crate::tracker::rect::Rect;
use crate::tracker::track::{Detection, TrackedObject};

/// Templates are resampled to this fixed square resolution.
const TEMPLATE_SIZE: usize = 24;
/// Correlation peak below which the filter has lost its target (the PSR
/// check in the original MOSSE formulation).
const MIN_PEAK: f32 = 0.25;

#[derive(Debug, Clone)]
struct CorrTrack {
    id: u64,
    bbox: Rect,
    label: String,
    score: f32,
    lost: u32,
    template: Vec<f32>,
}

#[derive(Debug)]
pub struct CorrelationTracker {
    iou_threshold: f32,
    max_lost: u32,
    last_id: u64,
    tracks: Vec<CorrTrack>,
}

impl CorrelationTracker {
    /// Thresholds are validated by the owning node before construction.
    pub fn new(iou_threshold: f32, max_lost: u32) -> Self {
        Self {
            iou_threshold,
            max_lost,
            last_id: 0,
            tracks: Vec::new(),
        }
    }

    pub fn update(&mut self, frame: &Frame, detections: &[Detection]) -> Vec<TrackedObject> {
        // Phase 1: advance every track by correlation search; filters whose
        // peak response collapses have lost their target and are dropped.
        let mut advanced = Vec::with_capacity(self.tracks.len());
        for mut track in self.tracks.drain(..) {
            match correlate(frame, &track.template, track.bbox) {
                Some((dx, dy)) => {
                    track.bbox = Rect::new(
                        track.bbox.x1 + dx as f32,
                        track.bbox.y1 + dy as f32,
                        track.bbox.x2 + dx as f32,
                        track.bbox.y2 + dy as f32,
                    );
                    track.template = extract_template(frame, track.bbox);
                    advanced.push(track);
                }
                None => {
                    debug!(id = track.id, "correlation peak collapsed, dropping track");
                }
            }
        }
        self.tracks = advanced;

        // Phase 2: fold detections in by overlap, exactly as the IoU
        // strategy does.
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
            track.template = extract_template(frame, det.bbox);
            track_matched[ti] = true;
            det_matched[di] = true;
        }

        for (ti, track) in self.tracks.iter_mut().enumerate() {
            if !track_matched[ti] {
                track.lost += 1;
            }
        }
        let max_lost = self.max_lost;
        self.tracks.retain(|t| t.lost <= max_lost);

        for (di, det) in detections.iter().enumerate() {
            if !det_matched[di] {
                self.last_id += 1;
                debug!(id = self.last_id, "spawned new correlation track");
                self.tracks.push(CorrTrack {
                    id: self.last_id,
                    bbox: det.bbox,
                    label: det.label.clone(),
                    score: det.score,
                    lost: 0,
                    template: extract_template(frame, det.bbox),
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

/// Resample the frame region under `bbox` to a fixed-size zero-mean,
/// unit-norm template. A flat patch yields the zero vector, which will fail
/// the peak check on the next frame.
fn extract_template(frame: &Frame, bbox: Rect) -> Vec<f32> {
    let patch = sample_patch(frame, bbox, 0, 0);
    normalize_patch(patch)
}

/// Search a window around the current box for the offset whose patch
/// correlates best with the template. Returns None when even the best peak
/// is too weak to trust.
fn correlate(frame: &Frame, template: &[f32], bbox: Rect) -> Option<(i64, i64)> {
    let radius = ((bbox.width().min(bbox.height()) / 4.0) as i64).max(2);
    let step = (radius / 4).max(1);

    let mut best: Option<(f32, i64, i64)> = None;
    let mut dy = -radius;
    while dy <= radius {
        let mut dx = -radius;
        while dx <= radius {
            let patch = normalize_patch(sample_patch(frame, bbox, dx, dy));
            let ncc: f32 = template.iter().zip(&patch).map(|(a, b)| a * b).sum();
            if best.is_none_or(|(score, _, _)| ncc > score) {
                best = Some((ncc, dx, dy));
            }
            dx += step;
        }
        dy += step;
    }

    match best {
        Some((score, dx, dy)) if score >= MIN_PEAK => Some((dx, dy)),
        _ => None,
    }
}

fn sample_patch(frame: &Frame, bbox: Rect, dx: i64, dy: i64) -> Vec<f32> {
    let mut patch = Vec::with_capacity(TEMPLATE_SIZE * TEMPLATE_SIZE);
    for row in 0..TEMPLATE_SIZE {
        for col in 0..TEMPLATE_SIZE {
            let fx = bbox.x1 + bbox.width() * (col as f32 + 0.5) / TEMPLATE_SIZE as f32;
            let fy = bbox.y1 + bbox.height() * (row as f32 + 0.5) / TEMPLATE_SIZE as f32;
            patch.push(frame.luma(fx as i64 + dx, fy as i64 + dy));
        }
    }
    patch
}

fn normalize_patch(mut patch: Vec<f32>) -> Vec<f32> {
    let mean = patch.iter().sum::<f32>() / patch.len() as f32;
    for v in patch.iter_mut() {
        *v -= mean;
    }
    let norm = patch.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 1e-6 {
        for v in patch.iter_mut() {
            *v /= norm;
        }
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 64;
    const H: u32 = 64;

    /// Black frame with a white square of the given size at (x, y).
    fn square_frame(x: usize, y: usize, size: usize) -> Vec<u8> {
        let mut data = vec![0u8; (W * H * 3) as usize];
        for row in y..y + size {
            for col in x..x + size {
                let base = (row * W as usize + col) * 3;
                data[base] = 255;
                data[base + 1] = 255;
                data[base + 2] = 255;
            }
        }
        data
    }

    #[test]
    fn test_track_follows_moving_square_without_detections() {
        let mut tracker = CorrelationTracker::new(0.1, 5);

        // detection box pads the square so the template keeps its edges
        let data = square_frame(10, 10, 16);
        let frame = Frame::new(&data, W, H).unwrap();
        let det = Detection::new(8.0, 8.0, 28.0, 28.0, "square", 0.9);
        let out = tracker.update(&frame, &[det]);
        assert_eq!(out.len(), 1);
        let id = out[0].id;

        // square moves; no detector output this frame
        let data = square_frame(13, 12, 16);
        let frame = Frame::new(&data, W, H).unwrap();
        let out = tracker.update(&frame, &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, id);

        let (cx, cy) = out[0].bbox.center();
        assert!((cx - 21.0).abs() <= 2.0, "cx = {cx}");
        assert!((cy - 20.0).abs() <= 2.0, "cy = {cy}");
    }

    #[test]
    fn test_detection_refreshes_matched_track() {
        let mut tracker = CorrelationTracker::new(0.1, 5);

        let data = square_frame(10, 10, 16);
        let frame = Frame::new(&data, W, H).unwrap();
        let id = tracker
            .update(&frame, &[Detection::new(8.0, 8.0, 28.0, 28.0, "square", 0.9)])[0]
            .id;

        let data = square_frame(12, 10, 16);
        let frame = Frame::new(&data, W, H).unwrap();
        let out = tracker.update(&frame, &[Detection::new(10.0, 8.0, 30.0, 28.0, "square", 0.95)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, id);
        assert_eq!(out[0].score, 0.95);
        assert_eq!(out[0].bbox, Rect::new(10.0, 8.0, 30.0, 28.0));
    }

    #[test]
    fn test_flat_scene_drops_track() {
        let mut tracker = CorrelationTracker::new(0.1, 5);

        // template extracted over a uniform region is degenerate
        let data = vec![0u8; (W * H * 3) as usize];
        let frame = Frame::new(&data, W, H).unwrap();
        let out = tracker.update(&frame, &[Detection::new(10.0, 10.0, 26.0, 26.0, "square", 0.9)]);
        assert_eq!(out.len(), 1);

        let out = tracker.update(&frame, &[]);
        assert!(out.is_empty());
    }
}
