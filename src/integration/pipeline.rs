//! TrackerPipeline for combining detection with tracking.

use crate::error::TrackError;
use crate::tracker::{BotSort, BotSortConfig, Track};

use super::DetectionSource;

/// End-to-end per-frame pipeline: any `DetectionSource` feeding a BoT-SORT
/// tracker.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    tracker: BotSort,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a new tracking pipeline with the given detector and tracker
    /// config. Fails fast on invalid configuration.
    pub fn new(detector: D, config: BotSortConfig) -> Result<Self, TrackError> {
        Ok(Self {
            detector,
            tracker: BotSort::new(config)?,
        })
    }

    /// Run detection on one frame and update the tracker with the result.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    ///
    /// # Returns
    /// A snapshot of every live track, or the detector's error.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Track>, D::Error> {
        let detections = self.detector.detect(input, width, height)?;
        Ok(self.tracker.update(&detections))
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn tracker(&self) -> &BotSort {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut BotSort {
        &mut self.tracker
    }
}
