mod bot_sort;
pub mod coords;
mod correlation;
mod iou_tracker;
mod kalman_filter;
mod matching;
mod rect;
mod track;
mod track_state;

pub use bot_sort::{BotSort, BotSortConfig};
pub use correlation::CorrelationTracker;
pub use iou_tracker::IouTracker;
pub use rect::{Rect, iou_batch};
pub use track::{Detection, Track, TrackedObject};
pub use track_state::TrackState;
