//! Single-object track state and lifecycle operations.

use ndarray::{Array1, Array2};

use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

/// One frame's raw detector output, not yet associated with any identity.
/// Owned by the caller and read-only to the trackers.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Bounding box in pixel coordinates (x1, y1, x2, y2)
    pub bbox: Rect,
    /// Class label, carried through to the matched track
    pub label: String,
    /// Detection confidence score in [0, 1]
    pub score: f32,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, label: impl Into<String>, score: f32) -> Self {
        Self {
            bbox: Rect::new(x1, y1, x2, y2),
            label: label.into(),
            score,
        }
    }

    pub fn from_rect(bbox: Rect, label: impl Into<String>, score: f32) -> Self {
        Self {
            bbox,
            label: label.into(),
            score,
        }
    }
}

/// Per-track output row handed to downstream nodes.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    pub id: u64,
    pub bbox: Rect,
    pub label: String,
    pub score: f32,
}

/// A single tracked object: identity, motion state and lifecycle counters.
///
/// Tracks are exclusively owned and mutated by the tracker that created
/// them; callers only see cloned snapshots.
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique identifier, assigned by the owning tracker, never reused
    pub id: u64,
    /// Current lifecycle state
    pub state: TrackState,
    /// Class label of the most recently associated detection
    pub label: String,
    /// Confidence score of the most recently associated detection
    pub score: f32,
    /// Frames since creation
    pub age: u32,
    /// Frames since the last successful association
    pub time_since_update: u32,
    /// Consecutive frames with a successful association
    pub hit_streak: u32,
    /// Frame id the track was created on
    pub start_frame: u32,
    /// Frame id of the last successful association
    pub frame_id: u32,
    /// Kalman state mean, (cx, cy, w, h) plus velocities
    mean: Array1<f64>,
    /// Kalman state covariance (8x8)
    covariance: Array2<f64>,
}

impl Track {
    /// Create and activate a track from an unmatched detection.
    ///
    /// New tracks start Tentative; a track created on the very first frame
    /// is confirmed immediately since no history exists to vet it against.
    pub fn new(det: &Detection, kf: &KalmanFilter, frame_id: u32, id: u64) -> Self {
        let xywh = det.bbox.to_xywh();
        let (mean, covariance) = kf.initiate([
            xywh[0] as f64,
            xywh[1] as f64,
            xywh[2] as f64,
            xywh[3] as f64,
        ]);

        Self {
            id,
            state: if frame_id == 1 {
                TrackState::Confirmed
            } else {
                TrackState::Tentative
            },
            label: det.label.clone(),
            score: det.score,
            age: 0,
            time_since_update: 0,
            hit_streak: 1,
            start_frame: frame_id,
            frame_id,
            mean,
            covariance,
        }
    }

    /// Current bounding box estimate: last correction, or the motion
    /// prediction when no detection matched. Always defined.
    pub fn bbox(&self) -> Rect {
        Rect::from_xywh(
            self.mean[0] as f32,
            self.mean[1] as f32,
            self.mean[2] as f32,
            self.mean[3] as f32,
        )
    }

    /// Advance the motion state by one frame. Size velocities of tracks
    /// without a fresh match are zeroed so stale boxes drift but do not
    /// balloon.
    pub fn predict(&mut self, kf: &KalmanFilter) {
        if self.state != TrackState::Confirmed {
            self.mean[6] = 0.0;
            self.mean[7] = 0.0;
        }
        let (mean, covariance) = kf.predict(&self.mean, &self.covariance);
        self.mean = mean;
        self.covariance = covariance;
        self.age += 1;
        self.time_since_update += 1;
    }

    /// Fuse a matched detection into the motion model. Promotes Tentative
    /// tracks to Confirmed.
    pub fn update(&mut self, det: &Detection, kf: &KalmanFilter, frame_id: u32) {
        self.correct(det, kf);
        self.state = TrackState::Confirmed;
        self.hit_streak += 1;
        self.time_since_update = 0;
        self.frame_id = frame_id;
    }

    /// Re-associate a Lost track with a detection before its removal
    /// deadline.
    pub fn re_activate(&mut self, det: &Detection, kf: &KalmanFilter, frame_id: u32) {
        self.correct(det, kf);
        self.state = TrackState::Confirmed;
        self.hit_streak = 1;
        self.time_since_update = 0;
        self.frame_id = frame_id;
    }

    /// Called when no detection matched this frame. The bbox stays at the
    /// predicted value.
    pub fn mark_missed(&mut self) {
        self.hit_streak = 0;
        if self.state == TrackState::Confirmed {
            self.state = TrackState::Lost;
        }
    }

    pub fn mark_removed(&mut self) {
        self.state = TrackState::Removed;
    }

    pub fn multi_predict(tracks: &mut [Track], kf: &KalmanFilter) {
        for track in tracks.iter_mut() {
            track.predict(kf);
        }
    }

    fn correct(&mut self, det: &Detection, kf: &KalmanFilter) {
        let xywh = det.bbox.to_xywh();
        let (mean, covariance) = kf.update(
            &self.mean,
            &self.covariance,
            [
                xywh[0] as f64,
                xywh[1] as f64,
                xywh[2] as f64,
                xywh[3] as f64,
            ],
        );
        self.mean = mean;
        self.covariance = covariance;
        self.label = det.label.clone();
        self.score = det.score;
    }
}

impl From<&Track> for TrackedObject {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id,
            bbox: track.bbox(),
            label: track.label.clone(),
            score: track.score,
        }
    }
}
