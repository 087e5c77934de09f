/// Lifecycle state of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// Freshly created from an unmatched detection; discarded fast if the
    /// very next frame fails to match.
    Tentative,
    /// Matched against detections; part of the regular output.
    Confirmed,
    /// No detection matched recently; position is motion-predicted until
    /// re-identification or removal.
    Lost,
    /// Terminal. Removed tracks never re-enter association or output.
    Removed,
}
