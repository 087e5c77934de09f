//! BoT-SORT track manager: two-stage association over confidence tiers.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{TrackError, check_at_least_one, check_unit_interval};
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching;
use crate::tracker::rect::{Rect, iou_batch};
use crate::tracker::track::{Detection, Track};
use crate::tracker::track_state::TrackState;

/// Gate for the second association pass against low-confidence detections.
const SECOND_PASS_GATE: f32 = 0.5;
/// Gate for matching last frame's tentative tracks.
const TENTATIVE_GATE: f32 = 0.7;
/// Overlap above which a tracked/lost pair is considered the same object.
const DUPLICATE_IOU: f32 = 0.85;

/// Configuration for the BoT-SORT tracker. All thresholds are validated at
/// construction; out-of-bound values are rejected with the offending
/// parameter named.
#[derive(Debug, Clone)]
pub struct BotSortConfig {
    /// Confidence score at or above which a detection is a "good" detection
    pub track_high_thresh: f32,
    /// Minimum confidence score; anything lower is discarded outright
    pub track_low_thresh: f32,
    /// Minimum score for an unmatched detection to spawn a new track
    pub new_track_thresh: f32,
    /// Maximum association cost accepted in the first matching pass
    pub match_thresh: f32,
    /// Frames a lost track may persist before removal, at 30 fps
    pub track_buffer: u32,
    /// Video frame rate
    pub frame_rate: u32,
}

impl Default for BotSortConfig {
    fn default() -> Self {
        Self {
            track_high_thresh: 0.6,
            track_low_thresh: 0.1,
            new_track_thresh: 0.7,
            match_thresh: 0.8,
            track_buffer: 30,
            frame_rate: 30,
        }
    }
}

impl BotSortConfig {
    pub fn validate(&self) -> Result<(), TrackError> {
        check_unit_interval("track_high_thresh", self.track_high_thresh)?;
        check_unit_interval("track_low_thresh", self.track_low_thresh)?;
        check_unit_interval("new_track_thresh", self.new_track_thresh)?;
        check_unit_interval("match_thresh", self.match_thresh)?;
        check_at_least_one("track_buffer", self.track_buffer)?;
        check_at_least_one("frame_rate", self.frame_rate)?;
        Ok(())
    }
}

/// Multi-object tracker in the BoT-SORT lineage.
///
/// Owns its track collection for the lifetime of a session. `update` is
/// called once per frame, synchronously; the returned snapshot covers every
/// live track (Tentative on its creation frame, Confirmed, and Lost tracks
/// still within their removal deadline).
#[derive(Debug)]
pub struct BotSort {
    config: BotSortConfig,
    tracked: Vec<Track>,
    lost: Vec<Track>,
    frame_id: u32,
    last_id: u64,
    max_time_lost: u32,
    kf: KalmanFilter,
}

impl BotSort {
    pub fn new(config: BotSortConfig) -> Result<Self, TrackError> {
        config.validate()?;
        // Low frame rates can truncate the scaled buffer to zero; a lost
        // track must always survive at least one missed frame.
        let max_time_lost =
            ((config.frame_rate as f32 / 30.0 * config.track_buffer as f32) as u32).max(1);
        Ok(Self {
            config,
            tracked: Vec::new(),
            lost: Vec::new(),
            frame_id: 0,
            last_id: 0,
            max_time_lost,
            kf: KalmanFilter::default(),
        })
    }

    pub fn config(&self) -> &BotSortConfig {
        &self.config
    }

    /// Ids are monotonically assigned and never reused within a session.
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    /// Run one frame of prediction, association and lifecycle management.
    pub fn update(&mut self, detections: &[Detection]) -> Vec<Track> {
        self.frame_id += 1;

        // Step 1: split detections into confidence tiers
        let mut dets_high = Vec::new();
        let mut dets_low = Vec::new();
        for det in detections {
            if det.score >= self.config.track_high_thresh {
                dets_high.push(det.clone());
            } else if det.score >= self.config.track_low_thresh {
                dets_low.push(det.clone());
            }
        }

        // Last frame's tentative tracks are handled separately; everything
        // else (Confirmed + Lost) forms the association pool.
        let mut tentative = Vec::new();
        let mut confirmed = Vec::new();
        for track in self.tracked.drain(..) {
            if track.state == TrackState::Tentative {
                tentative.push(track);
            } else {
                confirmed.push(track);
            }
        }
        let mut pool = joint_tracks(confirmed, std::mem::take(&mut self.lost));

        // Step 2: first association, pooled tracks x high-score detections
        Track::multi_predict(&mut pool, &self.kf);

        let pool_boxes: Vec<Rect> = pool.iter().map(|t| t.bbox()).collect();
        let high_boxes: Vec<Rect> = dets_high.iter().map(|d| d.bbox).collect();
        let high_scores: Vec<f32> = dets_high.iter().map(|d| d.score).collect();
        let mut dists = matching::iou_distance(&pool_boxes, &high_boxes);
        matching::fuse_score(&mut dists, &high_scores);

        let first = matching::linear_assignment(&dists, self.config.match_thresh);

        for &(itrack, idet) in &first.matches {
            let det = &dets_high[idet];
            let track = &mut pool[itrack];
            if track.state == TrackState::Lost {
                track.re_activate(det, &self.kf, self.frame_id);
                debug!(id = track.id, "re-identified lost track");
            } else {
                track.update(det, &self.kf, self.frame_id);
            }
        }

        // Step 3: second association, unmatched Confirmed tracks get one
        // more chance against the low-score tier with a looser gate
        let second_idx: Vec<usize> = first
            .unmatched_tracks
            .iter()
            .copied()
            .filter(|&i| pool[i].state == TrackState::Confirmed)
            .collect();
        let second_boxes: Vec<Rect> = second_idx.iter().map(|&i| pool[i].bbox()).collect();
        let low_boxes: Vec<Rect> = dets_low.iter().map(|d| d.bbox).collect();
        let dists_second = matching::iou_distance(&second_boxes, &low_boxes);

        let second = matching::linear_assignment(&dists_second, SECOND_PASS_GATE);

        let mut matched_second = vec![false; pool.len()];
        for &(si, idet) in &second.matches {
            let pool_idx = second_idx[si];
            pool[pool_idx].update(&dets_low[idet], &self.kf, self.frame_id);
            matched_second[pool_idx] = true;
        }

        // Step 4: pooled tracks missed in both passes age toward removal
        for &i in &first.unmatched_tracks {
            if matched_second[i] {
                continue;
            }
            let track = &mut pool[i];
            track.mark_missed();
            if track.state == TrackState::Lost && track.time_since_update > self.max_time_lost {
                track.mark_removed();
                debug!(id = track.id, "removed stale track");
            }
        }

        // Step 5: tentative tracks from the previous frame must re-match
        // now or be discarded
        let remaining: Vec<Detection> = first
            .unmatched_detections
            .iter()
            .map(|&i| dets_high[i].clone())
            .collect();
        let tentative_boxes: Vec<Rect> = tentative.iter().map(|t| t.bbox()).collect();
        let rem_boxes: Vec<Rect> = remaining.iter().map(|d| d.bbox).collect();
        let rem_scores: Vec<f32> = remaining.iter().map(|d| d.score).collect();
        let mut dists_tent = matching::iou_distance(&tentative_boxes, &rem_boxes);
        matching::fuse_score(&mut dists_tent, &rem_scores);

        let tent = matching::linear_assignment(&dists_tent, TENTATIVE_GATE);

        for &(it, idet) in &tent.matches {
            tentative[it].update(&remaining[idet], &self.kf, self.frame_id);
        }
        for &it in &tent.unmatched_tracks {
            tentative[it].mark_removed();
            debug!(id = tentative[it].id, "dropped unmatched tentative track");
        }

        // Step 6: leftover high-score detections spawn new tracks
        for &idet in &tent.unmatched_detections {
            let det = &remaining[idet];
            if det.score < self.config.new_track_thresh {
                continue;
            }
            let id = self.next_id();
            debug!(id, score = det.score, "spawned new track");
            tentative.push(Track::new(det, &self.kf, self.frame_id, id));
        }

        // Step 7: rebuild the live sets; Removed tracks drop out here and
        // never re-enter association or output
        let mut tracked_next = Vec::new();
        let mut lost_next = Vec::new();
        for track in pool.into_iter().chain(tentative) {
            match track.state {
                TrackState::Confirmed | TrackState::Tentative => tracked_next.push(track),
                TrackState::Lost => lost_next.push(track),
                TrackState::Removed => {}
            }
        }

        let (tracked_next, lost_next) = remove_duplicate_tracks(tracked_next, lost_next);
        self.tracked = tracked_next;
        self.lost = lost_next;

        self.tracked.iter().chain(self.lost.iter()).cloned().collect()
    }
}

/// Concatenate two track lists, keeping the first occurrence of each id.
fn joint_tracks(tlista: Vec<Track>, tlistb: Vec<Track>) -> Vec<Track> {
    let mut exists = HashSet::new();
    let mut res = Vec::new();
    for track in tlista.into_iter().chain(tlistb) {
        if exists.insert(track.id) {
            res.push(track);
        }
    }
    res
}

/// Resolve near-complete overlaps between the tracked and lost sets by
/// keeping whichever track has lived longer.
fn remove_duplicate_tracks(tracked: Vec<Track>, lost: Vec<Track>) -> (Vec<Track>, Vec<Track>) {
    if tracked.is_empty() || lost.is_empty() {
        return (tracked, lost);
    }

    let t_boxes: Vec<Rect> = tracked.iter().map(|t| t.bbox()).collect();
    let l_boxes: Vec<Rect> = lost.iter().map(|t| t.bbox()).collect();
    let ious = iou_batch(&t_boxes, &l_boxes);

    let mut dup_tracked = vec![false; tracked.len()];
    let mut dup_lost = vec![false; lost.len()];

    let (rows, cols) = ious.dim();
    for i in 0..rows {
        for j in 0..cols {
            if ious[[i, j]] > DUPLICATE_IOU {
                let time_tracked = tracked[i].frame_id - tracked[i].start_frame;
                let time_lost = lost[j].frame_id - lost[j].start_frame;
                if time_tracked > time_lost {
                    dup_lost[j] = true;
                } else {
                    dup_tracked[i] = true;
                }
            }
        }
    }

    let tracked = tracked
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !dup_tracked[*i])
        .map(|(_, t)| t)
        .collect();
    let lost = lost
        .into_iter()
        .enumerate()
        .filter(|(j, _)| !dup_lost[*j])
        .map(|(_, t)| t)
        .collect();

    (tracked, lost)
}
